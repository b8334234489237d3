use std::sync::Arc;

use crate::domain::device::models::requests::GetDevicesByBrandRequest;
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::handler::OperationResult;
use crate::inbound::http::params::{BindError, Params, RawRequest};
use crate::inbound::http::responses::DeviceResponseData;

impl Params for GetDevicesByBrandRequest {
    fn bind(&mut self, req: &RawRequest) -> Result<(), BindError> {
        self.brand = req.path("brand")?;
        Ok(())
    }
}

pub async fn get_devices_by_brand<DS: DeviceService>(
    service: Arc<DS>,
    req: GetDevicesByBrandRequest,
) -> OperationResult<Vec<DeviceResponseData>> {
    let devices = service.get_devices_by_brand(&req).await?;

    Ok(Some(DeviceResponseData::list(&devices)))
}
