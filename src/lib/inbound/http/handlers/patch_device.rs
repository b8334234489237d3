use std::sync::Arc;

use crate::domain::device::models::requests::PatchDeviceRequest;
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::handler::OperationResult;
use crate::inbound::http::params::{BindError, Params, RawRequest};
use crate::inbound::http::responses::DeviceResponseData;

impl Params for PatchDeviceRequest {
    fn bind(&mut self, req: &RawRequest) -> Result<(), BindError> {
        *self = req.json()?;
        self.id = req.path("id")?;
        Ok(())
    }
}

pub async fn patch_device<DS: DeviceService>(
    service: Arc<DS>,
    req: PatchDeviceRequest,
) -> OperationResult<DeviceResponseData> {
    let device = service.patch_device(&req).await?;

    Ok(Some((&device).into()))
}
