use std::sync::Arc;

use crate::domain::device::ports::DeviceService;
use crate::inbound::http::handler::OperationResult;
use crate::inbound::http::params::NoParams;
use crate::inbound::http::responses::DeviceResponseData;

pub async fn get_devices<DS: DeviceService>(
    service: Arc<DS>,
    _: NoParams,
) -> OperationResult<Vec<DeviceResponseData>> {
    let devices = service.get_all_devices().await?;

    Ok(Some(DeviceResponseData::list(&devices)))
}
