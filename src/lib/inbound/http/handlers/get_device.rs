use std::sync::Arc;

use crate::domain::device::models::requests::GetDeviceByIdRequest;
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::handler::OperationResult;
use crate::inbound::http::params::{BindError, Params, RawRequest};
use crate::inbound::http::responses::DeviceResponseData;

impl Params for GetDeviceByIdRequest {
    fn bind(&mut self, req: &RawRequest) -> Result<(), BindError> {
        self.id = req.path("id")?;
        Ok(())
    }
}

pub async fn get_device<DS: DeviceService>(
    service: Arc<DS>,
    req: GetDeviceByIdRequest,
) -> OperationResult<DeviceResponseData> {
    let device = service.get_device_by_id(&req).await?;

    Ok(Some((&device).into()))
}
