use std::sync::Arc;

use crate::domain::device::models::device::DeviceState;
use crate::domain::device::models::requests::GetDevicesByStateRequest;
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::handler::OperationResult;
use crate::inbound::http::params::{BindError, Params, RawRequest};
use crate::inbound::http::responses::DeviceResponseData;

impl Params for GetDevicesByStateRequest {
    fn bind(&mut self, req: &RawRequest) -> Result<(), BindError> {
        self.state = req.path::<DeviceState>("state")?;
        Ok(())
    }
}

pub async fn get_devices_by_state<DS: DeviceService>(
    service: Arc<DS>,
    req: GetDevicesByStateRequest,
) -> OperationResult<Vec<DeviceResponseData>> {
    let devices = service.get_devices_by_state(&req).await?;

    Ok(Some(DeviceResponseData::list(&devices)))
}
