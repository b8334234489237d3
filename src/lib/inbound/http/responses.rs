use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::device::models::device::{Device, DeviceState};
use crate::domain::error::Error;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceResponseData {
    id: i64,
    name: String,
    brand: String,
    state: DeviceState,
    creation_time: DateTime<Utc>,
}

impl From<&Device> for DeviceResponseData {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id().into_inner(),
            name: device.name().to_string(),
            brand: device.brand().to_string(),
            state: device.state(),
            creation_time: *device.creation_time(),
        }
    }
}

impl DeviceResponseData {
    pub fn list(devices: &[Device]) -> Vec<Self> {
        devices.iter().map(Self::from).collect()
    }
}
