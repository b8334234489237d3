use std::sync::Arc;

use crate::domain::device::models::requests::CreateDeviceRequest;
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::handler::OperationResult;
use crate::inbound::http::params::{BindError, Params, RawRequest};
use crate::inbound::http::responses::DeviceResponseData;

impl Params for CreateDeviceRequest {
    fn bind(&mut self, req: &RawRequest) -> Result<(), BindError> {
        *self = req.json()?;
        Ok(())
    }
}

pub async fn create_device<DS: DeviceService>(
    service: Arc<DS>,
    req: CreateDeviceRequest,
) -> OperationResult<DeviceResponseData> {
    let device = service.create_device(&req).await?;

    Ok(Some((&device).into()))
}
