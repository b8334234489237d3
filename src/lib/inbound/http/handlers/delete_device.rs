use std::sync::Arc;

use crate::domain::device::models::requests::DeleteDeviceRequest;
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::handler::OperationResult;
use crate::inbound::http::params::{BindError, Params, RawRequest};

impl Params for DeleteDeviceRequest {
    fn bind(&mut self, req: &RawRequest) -> Result<(), BindError> {
        self.id = req.path("id")?;
        Ok(())
    }
}

pub async fn delete_device<DS: DeviceService>(
    service: Arc<DS>,
    req: DeleteDeviceRequest,
) -> OperationResult<()> {
    service.delete_device(&req).await?;

    Ok(None)
}
