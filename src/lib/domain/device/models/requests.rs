//! Parameter shapes accepted by the device domain.
//!
//! Every shape is a plain, zero-valued-by-default carrier: an inbound adapter fills a fresh
//! instance per request and [validates](Validate) it before handing it to the
//! [DeviceService](crate::domain::device::ports::DeviceService).

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::device::models::device::{DeviceId, DeviceState};

/// Data required by the domain to create a [Device](super::device::Device). State and creation
/// time are assigned by the domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CreateDeviceRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "brand is required"))]
    pub brand: String,
}

/// Full replacement of a device's mutable fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateDeviceRequest {
    pub id: DeviceId,
    pub name: String,
    pub brand: String,
    pub state: Option<DeviceState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
}

impl UpdateDeviceRequest {
    pub fn writes_creation_time(&self) -> bool {
        is_set(&self.creation_time)
    }
}

impl Validate for UpdateDeviceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_id(self.id, &mut errors);
        if self.name.is_empty() {
            errors.add("name", invalid("required", "name is required"));
        }
        if self.brand.is_empty() {
            errors.add("brand", invalid("required", "brand is required"));
        }
        if self.state.is_none() {
            errors.add("state", invalid("required", "state is required"));
        }
        check_creation_time_absent(&self.creation_time, &mut errors);

        into_result(errors)
    }
}

/// Partial update: only the fields that are present are compared and applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchDeviceRequest {
    pub id: DeviceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<DeviceState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
}

impl PatchDeviceRequest {
    pub fn writes_creation_time(&self) -> bool {
        is_set(&self.creation_time)
    }
}

impl Validate for PatchDeviceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_id(self.id, &mut errors);
        check_creation_time_absent(&self.creation_time, &mut errors);

        into_result(errors)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetDeviceByIdRequest {
    pub id: DeviceId,
}

impl Validate for GetDeviceByIdRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_id(self.id, &mut errors);
        into_result(errors)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GetDevicesByBrandRequest {
    #[validate(length(min = 1, message = "brand is required"))]
    pub brand: String,
}

/// The state comes from the route, so any bound value is valid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GetDevicesByStateRequest {
    pub state: DeviceState,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDeviceRequest {
    pub id: DeviceId,
}

impl Validate for DeleteDeviceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_id(self.id, &mut errors);
        into_result(errors)
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn check_id(id: DeviceId, errors: &mut ValidationErrors) {
    if !id.is_assigned() {
        errors.add("id", invalid("range", "id must be a positive integer"));
    }
}

/// Seconds from the Unix epoch back to `0001-01-01T00:00:00Z`.
const ZERO_TIME_SECS: i64 = -62_135_596_800;

// The zero timestamp counts as unset.
fn is_set(creation_time: &Option<DateTime<Utc>>) -> bool {
    creation_time
        .is_some_and(|t| t.timestamp() != ZERO_TIME_SECS || t.timestamp_subsec_nanos() != 0)
}

// Creation time is write-once.
fn check_creation_time_absent(
    creation_time: &Option<DateTime<Utc>>,
    errors: &mut ValidationErrors,
) {
    if is_set(creation_time) {
        errors.add(
            "creation_time",
            invalid("no_update", "creation time cannot be updated"),
        );
    }
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
