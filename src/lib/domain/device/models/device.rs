use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage-assigned device identifier. Zero means "not yet assigned".
#[derive(
    Display,
    From,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(i64);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0} is not a valid device id")]
pub struct DeviceIdError(String);

impl DeviceId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn is_assigned(&self) -> bool {
        self.0 >= 1
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl FromStr for DeviceId {
    type Err = DeviceIdError;

    fn from_str(raw_id: &str) -> Result<Self, Self::Err> {
        raw_id
            .parse::<i64>()
            .map(Self)
            .map_err(|_| DeviceIdError(raw_id.to_string()))
    }
}

/// Lifecycle state of a [Device]. Every state may move to every other one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceState {
    #[default]
    Available,
    InUse,
    Inactive,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("not a valid state: {0}")]
pub struct DeviceStateError(String);

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Available => "available",
            DeviceState::InUse => "in-use",
            DeviceState::Inactive => "inactive",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceState {
    type Err = DeviceStateError;

    fn from_str(raw_state: &str) -> Result<Self, Self::Err> {
        match raw_state {
            "available" => Ok(DeviceState::Available),
            "in-use" => Ok(DeviceState::InUse),
            "inactive" => Ok(DeviceState::Inactive),
            other => Err(DeviceStateError(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    id: DeviceId,
    name: String,
    brand: String,
    state: DeviceState,
    creation_time: DateTime<Utc>,
}

impl Device {
    pub fn new(
        id: DeviceId,
        name: String,
        brand: String,
        state: DeviceState,
        creation_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            brand,
            state,
            creation_time,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn creation_time(&self) -> &DateTime<Utc> {
        &self.creation_time
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_brand(&mut self, brand: String) {
        self.brand = brand;
    }

    pub fn set_state(&mut self, state: DeviceState) {
        self.state = state;
    }

    /// Reports whether writing `name` and `brand` would break the state lock: while a device is
    /// in use its name and brand are frozen. `None` means the field is not being written.
    pub fn is_locked_against(&self, name: Option<&str>, brand: Option<&str>) -> bool {
        if self.state != DeviceState::InUse {
            return false;
        }

        name.is_some_and(|name| name != self.name) || brand.is_some_and(|brand| brand != self.brand)
    }
}

/// Data required by a repository to persist a new [Device].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDevice {
    name: String,
    brand: String,
    state: DeviceState,
    creation_time: DateTime<Utc>,
}

impl NewDevice {
    pub fn new(
        name: String,
        brand: String,
        state: DeviceState,
        creation_time: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            brand,
            state,
            creation_time,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn creation_time(&self) -> &DateTime<Utc> {
        &self.creation_time
    }

    pub fn into_device(self, id: DeviceId) -> Device {
        Device::new(id, self.name, self.brand, self.state, self.creation_time)
    }
}

/// Failure reported by a [DeviceRepository](crate::domain::device::ports::DeviceRepository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("device not found")]
    NotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[cfg(test)]
mod device_id_tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let result = "42".parse::<DeviceId>();
        let expected = Ok(DeviceId(42));

        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_invalid_id() {
        let result = "abracadabra".parse::<DeviceId>();
        let expected = Err(DeviceIdError("abracadabra".to_string()));

        assert_eq!(result, expected);
    }

    #[test]
    fn test_zero_is_not_assigned() {
        assert!(!DeviceId::default().is_assigned());
        assert!(DeviceId::new(1).is_assigned());
    }
}


#[cfg(test)]
mod device_tests {
    use super::*;

    fn device(state: DeviceState) -> Device {
        Device::new(
            DeviceId::new(1),
            "Pixel".to_string(),
            "Google".to_string(),
            state,
            Utc::now(),
        )
    }

    #[test]
    fn test_in_use_locks_name_and_brand() {
        let device = device(DeviceState::InUse);

        assert!(device.is_locked_against(Some("Pixel 2"), None));
        assert!(device.is_locked_against(None, Some("Alphabet")));
        assert!(device.is_locked_against(Some("Pixel"), Some("Alphabet")));
    }

    #[test]
    fn test_in_use_allows_unchanged_or_omitted_fields() {
        let device = device(DeviceState::InUse);

        assert!(!device.is_locked_against(None, None));
        assert!(!device.is_locked_against(Some("Pixel"), Some("Google")));
    }

    #[test]
    fn test_other_states_never_lock() {
        for state in [DeviceState::Available, DeviceState::Inactive] {
            let device = device(state);

            assert!(!device.is_locked_against(Some("Pixel 2"), Some("Alphabet")));
        }
    }
}
