use std::sync::Arc;

use crate::domain::device::models::requests::UpdateDeviceRequest;
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::handler::OperationResult;
use crate::inbound::http::params::{BindError, Params, RawRequest};
use crate::inbound::http::responses::DeviceResponseData;

impl Params for UpdateDeviceRequest {
    fn bind(&mut self, req: &RawRequest) -> Result<(), BindError> {
        *self = req.json()?;
        self.id = req.path("id")?;
        Ok(())
    }
}

pub async fn update_device<DS: DeviceService>(
    service: Arc<DS>,
    req: UpdateDeviceRequest,
) -> OperationResult<DeviceResponseData> {
    let device = service.update_device(&req).await?;

    Ok(Some((&device).into()))
}
