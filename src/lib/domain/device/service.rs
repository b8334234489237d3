use chrono::Utc;

use crate::domain::device::models::device::{
    Device, DeviceId, DeviceState, NewDevice, RepositoryError,
};
use crate::domain::device::models::requests::{
    CreateDeviceRequest, DeleteDeviceRequest, GetDeviceByIdRequest, GetDevicesByBrandRequest,
    GetDevicesByStateRequest, PatchDeviceRequest, UpdateDeviceRequest,
};
use crate::domain::device::ports::{DeviceRepository, DeviceService};
use crate::domain::error::{Error, ErrorKind};

const DEVICE_NOT_FOUND: &str = "device not found";
const CREATION_TIME_IMMUTABLE: &str = "cannot update creation time of a device";
const DEVICE_IN_USE_LOCKED: &str = "cannot update name or brand of a device in use";
const DEVICE_IN_USE_DELETE: &str = "cannot delete a device that is in use";
const STATE_REQUIRED: &str = "state is required for a full update";

/// Canonical implementation of the [DeviceService] port, through which the device domain API is
/// consumed.
#[derive(Debug, Clone)]
pub struct Service<R: DeviceRepository> {
    repo: R,
}

impl<R: DeviceRepository> Service<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    async fn load(&self, id: DeviceId, kind: ErrorKind) -> Result<Device, Error> {
        self.repo
            .get_device_by_id(id)
            .await
            .map_err(|e| storage_error(kind, e))
    }

    async fn save(&self, device: &Device) -> Result<(), Error> {
        self.repo
            .update_device(device)
            .await
            .map_err(|e| storage_error(ErrorKind::UpdateError, e))
    }
}

impl<R: DeviceRepository> DeviceService for Service<R> {
    async fn create_device(&self, req: &CreateDeviceRequest) -> Result<Device, Error> {
        let new_device = NewDevice::new(
            req.name.clone(),
            req.brand.clone(),
            DeviceState::default(),
            Utc::now(),
        );

        self.repo
            .create_device(&new_device)
            .await
            .map_err(|e| storage_error(ErrorKind::CreateError, e))
    }

    async fn update_device(&self, req: &UpdateDeviceRequest) -> Result<Device, Error> {
        if req.writes_creation_time() {
            return Err(Error::forbidden(
                ErrorKind::UpdateError,
                CREATION_TIME_IMMUTABLE,
            ));
        }
        let Some(state) = req.state else {
            return Err(Error::bad_request(ErrorKind::UpdateError, STATE_REQUIRED));
        };

        let mut device = self.load(req.id, ErrorKind::UpdateError).await?;

        if device.is_locked_against(Some(&req.name), Some(&req.brand)) {
            return Err(Error::forbidden(ErrorKind::UpdateError, DEVICE_IN_USE_LOCKED));
        }

        device.set_name(req.name.clone());
        device.set_brand(req.brand.clone());
        device.set_state(state);

        self.save(&device).await?;

        Ok(device)
    }

    async fn patch_device(&self, req: &PatchDeviceRequest) -> Result<Device, Error> {
        if req.writes_creation_time() {
            return Err(Error::forbidden(
                ErrorKind::UpdateError,
                CREATION_TIME_IMMUTABLE,
            ));
        }

        let mut device = self.load(req.id, ErrorKind::PatchError).await?;

        if device.is_locked_against(req.name.as_deref(), req.brand.as_deref()) {
            return Err(Error::forbidden(ErrorKind::PatchError, DEVICE_IN_USE_LOCKED));
        }

        if let Some(name) = &req.name {
            device.set_name(name.clone());
        }
        if let Some(brand) = &req.brand {
            device.set_brand(brand.clone());
        }
        if let Some(state) = req.state {
            device.set_state(state);
        }

        self.save(&device).await?;

        Ok(device)
    }

    async fn get_all_devices(&self) -> Result<Vec<Device>, Error> {
        self.repo
            .get_all_devices()
            .await
            .map_err(fetch_error)
    }

    async fn get_device_by_id(&self, req: &GetDeviceByIdRequest) -> Result<Device, Error> {
        self.load(req.id, ErrorKind::GetByIdError).await
    }

    async fn get_devices_by_brand(
        &self,
        req: &GetDevicesByBrandRequest,
    ) -> Result<Vec<Device>, Error> {
        self.repo
            .get_devices_by_brand(&req.brand)
            .await
            .map_err(fetch_error)
    }

    async fn get_devices_by_state(
        &self,
        req: &GetDevicesByStateRequest,
    ) -> Result<Vec<Device>, Error> {
        self.repo
            .get_devices_by_state(req.state)
            .await
            .map_err(fetch_error)
    }

    async fn delete_device(&self, req: &DeleteDeviceRequest) -> Result<(), Error> {
        let device = self.load(req.id, ErrorKind::DeleteError).await?;

        if device.state() == DeviceState::InUse {
            return Err(Error::forbidden(ErrorKind::DeleteError, DEVICE_IN_USE_DELETE));
        }

        self.repo
            .delete_device(req.id)
            .await
            .map_err(|e| storage_error(ErrorKind::DeleteError, e))
    }
}

/// Maps a repository failure onto the operation's error tag. A missing row is always
/// `not_found`, whatever the operation.
fn storage_error(kind: ErrorKind, e: RepositoryError) -> Error {
    match e {
        RepositoryError::NotFound => Error::not_found(DEVICE_NOT_FOUND),
        RepositoryError::Unknown(cause) => {
            tracing::error!("{}: {:?}", kind, cause);
            Error::internal(kind, format!("{:#}", cause))
        }
    }
}

// List reads have no single row to miss.
fn fetch_error(e: RepositoryError) -> Error {
    tracing::error!("{}: {:?}", ErrorKind::FetchError, e);
    Error::internal(ErrorKind::FetchError, format!("{:#}", e))
}

#[cfg(test)]
mod service_tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;
    use chrono::DateTime;

    use super::*;

    /// In-memory [DeviceRepository] that can be told to fail reads or writes.
    #[derive(Clone, Default)]
    struct MemoryRepository {
        devices: Arc<Mutex<BTreeMap<DeviceId, Device>>>,
        writes: Arc<AtomicUsize>,
        reads: Arc<AtomicUsize>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MemoryRepository {
        fn failing_reads() -> Self {
            Self {
                fail_reads: true,
                ..Default::default()
            }
        }

        fn failing_writes() -> Self {
            Self {
                fail_writes: true,
                ..Default::default()
            }
        }

        fn seed(&self, name: &str, brand: &str, state: DeviceState) -> Device {
            let mut devices = self.devices.lock().unwrap();
            let id = DeviceId::new(devices.len() as i64 + 1);
            let device = Device::new(
                id,
                name.to_string(),
                brand.to_string(),
                state,
                DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            );
            devices.insert(id, device.clone());
            device
        }

        fn stored(&self, id: DeviceId) -> Option<Device> {
            self.devices.lock().unwrap().get(&id).cloned()
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn read(&self) -> Result<(), RepositoryError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(anyhow!("connection reset").into());
            }
            Ok(())
        }

        fn write(&self) -> Result<(), RepositoryError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(anyhow!("disk I/O error").into());
            }
            Ok(())
        }

        fn filtered(&self, keep: impl Fn(&Device) -> bool) -> Vec<Device> {
            self.devices
                .lock()
                .unwrap()
                .values()
                .filter(|d| keep(d))
                .cloned()
                .collect()
        }
    }

    impl DeviceRepository for MemoryRepository {
        async fn create_device(&self, device: &NewDevice) -> Result<Device, RepositoryError> {
            self.write()?;
            let mut devices = self.devices.lock().unwrap();
            let id = DeviceId::new(devices.len() as i64 + 1);
            let device = device.clone().into_device(id);
            devices.insert(id, device.clone());
            Ok(device)
        }

        async fn update_device(&self, device: &Device) -> Result<(), RepositoryError> {
            self.write()?;
            let mut devices = self.devices.lock().unwrap();
            let stored = devices
                .get_mut(&device.id())
                .ok_or(RepositoryError::NotFound)?;
            stored.set_name(device.name().to_string());
            stored.set_brand(device.brand().to_string());
            stored.set_state(device.state());
            Ok(())
        }

        async fn get_all_devices(&self) -> Result<Vec<Device>, RepositoryError> {
            self.read()?;
            Ok(self.filtered(|_| true))
        }

        async fn get_device_by_id(&self, id: DeviceId) -> Result<Device, RepositoryError> {
            self.read()?;
            self.stored(id).ok_or(RepositoryError::NotFound)
        }

        async fn get_devices_by_brand(&self, brand: &str) -> Result<Vec<Device>, RepositoryError> {
            self.read()?;
            Ok(self.filtered(|d| d.brand() == brand))
        }

        async fn get_devices_by_state(
            &self,
            state: DeviceState,
        ) -> Result<Vec<Device>, RepositoryError> {
            self.read()?;
            Ok(self.filtered(|d| d.state() == state))
        }

        async fn delete_device(&self, id: DeviceId) -> Result<(), RepositoryError> {
            self.write()?;
            self.devices
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        }
    }

    fn update(id: DeviceId, name: &str, brand: &str, state: DeviceState) -> UpdateDeviceRequest {
        UpdateDeviceRequest {
            id,
            name: name.to_string(),
            brand: brand.to_string(),
            state: Some(state),
            creation_time: None,
        }
    }

    fn patch(id: DeviceId) -> PatchDeviceRequest {
        PatchDeviceRequest {
            id,
            ..Default::default()
        }
    }

    fn assert_error(result: Error, kind: ErrorKind, status: u16) {
        assert_eq!(result.kind(), kind, "{result}");
        assert_eq!(result.status(), status, "{result}");
    }

    #[tokio::test]
    async fn test_create_device_success() {
        let repo = MemoryRepository::default();
        let service = Service::new(repo.clone());
        let started_at = Utc::now();

        let req = CreateDeviceRequest {
            name: "X".to_string(),
            brand: "Y".to_string(),
        };
        let created = service.create_device(&req).await.unwrap();

        assert!(created.id().is_assigned());
        let fetched = service
            .get_device_by_id(&GetDeviceByIdRequest { id: created.id() })
            .await
            .unwrap();
        assert_eq!(fetched.name(), "X");
        assert_eq!(fetched.brand(), "Y");
        assert_eq!(fetched.state(), DeviceState::Available);
        assert!(*fetched.creation_time() >= started_at);
    }

    #[tokio::test]
    async fn test_create_device_storage_failure() {
        let service = Service::new(MemoryRepository::failing_writes());

        let result = service
            .create_device(&CreateDeviceRequest::default())
            .await
            .unwrap_err();

        assert_error(result, ErrorKind::CreateError, 500);
    }

    #[tokio::test]
    async fn test_update_device_success() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Old Name", "Same Brand", DeviceState::Available);
        let service = Service::new(repo.clone());

        let updated = service
            .update_device(&update(device.id(), "New Name", "Same Brand", DeviceState::Inactive))
            .await
            .unwrap();

        assert_eq!(updated.name(), "New Name");
        assert_eq!(updated.state(), DeviceState::Inactive);
        assert_eq!(updated.creation_time(), device.creation_time());
        assert_eq!(repo.stored(device.id()), Some(updated));
    }

    #[tokio::test]
    async fn test_update_device_not_found() {
        let service = Service::new(MemoryRepository::default());

        let result = service
            .update_device(&update(DeviceId::new(99), "a", "b", DeviceState::Available))
            .await
            .unwrap_err();

        assert_error(result, ErrorKind::NotFound, 404);
    }

    #[tokio::test]
    async fn test_update_device_read_failure() {
        let service = Service::new(MemoryRepository::failing_reads());

        let result = service
            .update_device(&update(DeviceId::new(1), "a", "b", DeviceState::Available))
            .await
            .unwrap_err();

        assert_error(result, ErrorKind::UpdateError, 500);
    }

    #[tokio::test]
    async fn test_update_device_write_failure() {
        let repo = MemoryRepository::failing_writes();
        let device = repo.seed("a", "b", DeviceState::Available);
        let service = Service::new(repo);

        let result = service
            .update_device(&update(device.id(), "c", "d", DeviceState::Available))
            .await
            .unwrap_err();

        assert_error(result, ErrorKind::UpdateError, 500);
    }

    #[tokio::test]
    async fn test_update_device_in_use_name_or_brand_forbidden() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::InUse);
        let service = Service::new(repo.clone());

        for (name, brand) in [("Pixel2", "Google"), ("Pixel", "Alphabet")] {
            let result = service
                .update_device(&update(device.id(), name, brand, DeviceState::InUse))
                .await
                .unwrap_err();

            assert_error(result, ErrorKind::UpdateError, 403);
        }
        assert_eq!(repo.writes(), 0);
        assert_eq!(repo.stored(device.id()), Some(device));
    }

    #[tokio::test]
    async fn test_update_device_in_use_rename_forbidden_even_when_releasing() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::InUse);
        let service = Service::new(repo);

        let result = service
            .update_device(&update(device.id(), "Pixel2", "Google", DeviceState::Available))
            .await
            .unwrap_err();

        assert_error(result, ErrorKind::UpdateError, 403);
    }

    #[tokio::test]
    async fn test_update_device_in_use_state_change_allowed() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::InUse);
        let service = Service::new(repo);

        let updated = service
            .update_device(&update(device.id(), "Pixel", "Google", DeviceState::Available))
            .await
            .unwrap();

        assert_eq!(updated.state(), DeviceState::Available);
    }

    #[tokio::test]
    async fn test_update_device_creation_time_rejected_before_storage() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::Available);
        let service = Service::new(repo.clone());

        let req = UpdateDeviceRequest {
            creation_time: Some(Utc::now()),
            ..update(device.id(), "Pixel", "Google", DeviceState::Available)
        };
        let result = service.update_device(&req).await.unwrap_err();

        assert_error(result, ErrorKind::UpdateError, 403);
        assert_eq!(repo.reads(), 0);
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn test_update_device_without_state_rejected_before_storage() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::Inactive);
        let service = Service::new(repo.clone());

        let req = UpdateDeviceRequest {
            state: None,
            ..update(device.id(), "Pixel 2", "Google", DeviceState::Available)
        };
        let result = service.update_device(&req).await.unwrap_err();

        assert_error(result, ErrorKind::UpdateError, 400);
        assert_eq!(repo.reads(), 0);
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn test_update_device_zero_creation_time_is_ignored() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::Available);
        let service = Service::new(repo);

        let req = UpdateDeviceRequest {
            creation_time: DateTime::parse_from_rfc3339("0001-01-01T00:00:00Z")
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            ..update(device.id(), "Pixel 2", "Google", DeviceState::Available)
        };
        assert!(req.creation_time.is_some());
        let updated = service.update_device(&req).await.unwrap();

        assert_eq!(updated.name(), "Pixel 2");
        assert_eq!(updated.creation_time(), device.creation_time());
    }

    #[tokio::test]
    async fn test_patch_device_applies_only_present_fields() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::Available);
        let service = Service::new(repo);

        let req = PatchDeviceRequest {
            brand: Some("Alphabet".to_string()),
            ..patch(device.id())
        };
        let patched = service.patch_device(&req).await.unwrap();

        assert_eq!(patched.name(), "Pixel");
        assert_eq!(patched.brand(), "Alphabet");
        assert_eq!(patched.state(), DeviceState::Available);
    }

    #[tokio::test]
    async fn test_patch_device_empty_is_noop_write() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::InUse);
        let service = Service::new(repo.clone());

        let patched = service.patch_device(&patch(device.id())).await.unwrap();

        assert_eq!(patched, device);
        assert_eq!(repo.writes(), 1);
        assert_eq!(repo.stored(device.id()), Some(device));
    }

    #[tokio::test]
    async fn test_patch_device_in_use_state_only_allowed() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::InUse);
        let service = Service::new(repo);

        let req = PatchDeviceRequest {
            state: Some(DeviceState::Inactive),
            ..patch(device.id())
        };
        let patched = service.patch_device(&req).await.unwrap();

        assert_eq!(patched.state(), DeviceState::Inactive);
    }

    #[tokio::test]
    async fn test_patch_device_in_use_same_values_allowed() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::InUse);
        let service = Service::new(repo);

        let req = PatchDeviceRequest {
            name: Some("Pixel".to_string()),
            brand: Some("Google".to_string()),
            ..patch(device.id())
        };

        assert!(service.patch_device(&req).await.is_ok());
    }

    #[tokio::test]
    async fn test_patch_device_in_use_brand_forbidden() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::InUse);
        let service = Service::new(repo.clone());

        let req = PatchDeviceRequest {
            brand: Some("Alphabet".to_string()),
            state: Some(DeviceState::Available),
            ..patch(device.id())
        };
        let result = service.patch_device(&req).await.unwrap_err();

        assert_error(result, ErrorKind::PatchError, 403);
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn test_patch_device_creation_time_rejected() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::Available);
        let service = Service::new(repo.clone());

        let req = PatchDeviceRequest {
            creation_time: Some(Utc::now()),
            ..patch(device.id())
        };
        let result = service.patch_device(&req).await.unwrap_err();

        assert_error(result, ErrorKind::UpdateError, 403);
        assert_eq!(repo.reads(), 0);
    }

    #[tokio::test]
    async fn test_patch_device_not_found() {
        let service = Service::new(MemoryRepository::default());

        let result = service
            .patch_device(&patch(DeviceId::new(999_999)))
            .await
            .unwrap_err();

        assert_error(result, ErrorKind::NotFound, 404);
    }

    #[tokio::test]
    async fn test_patch_device_read_and_write_failures() {
        let service = Service::new(MemoryRepository::failing_reads());
        let result = service
            .patch_device(&patch(DeviceId::new(1)))
            .await
            .unwrap_err();
        assert_error(result, ErrorKind::PatchError, 500);

        let repo = MemoryRepository::failing_writes();
        let device = repo.seed("Pixel", "Google", DeviceState::Available);
        let service = Service::new(repo);
        let result = service.patch_device(&patch(device.id())).await.unwrap_err();
        assert_error(result, ErrorKind::UpdateError, 500);
    }

    #[tokio::test]
    async fn test_list_reads_pass_through() {
        let repo = MemoryRepository::default();
        repo.seed("Pixel", "Google", DeviceState::Available);
        repo.seed("Galaxy", "Samsung", DeviceState::InUse);
        repo.seed("Nest", "Google", DeviceState::InUse);
        let service = Service::new(repo);

        let all = service.get_all_devices().await.unwrap();
        let google = service
            .get_devices_by_brand(&GetDevicesByBrandRequest {
                brand: "Google".to_string(),
            })
            .await
            .unwrap();
        let in_use = service
            .get_devices_by_state(&GetDevicesByStateRequest {
                state: DeviceState::InUse,
            })
            .await
            .unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(
            google.iter().map(|d| d.name()).collect::<Vec<_>>(),
            vec!["Pixel", "Nest"]
        );
        assert_eq!(
            in_use.iter().map(|d| d.name()).collect::<Vec<_>>(),
            vec!["Galaxy", "Nest"]
        );
    }

    #[tokio::test]
    async fn test_list_reads_failure_is_fetch_error() {
        let service = Service::new(MemoryRepository::failing_reads());

        let all = service.get_all_devices().await.unwrap_err();
        let by_brand = service
            .get_devices_by_brand(&GetDevicesByBrandRequest {
                brand: "Google".to_string(),
            })
            .await
            .unwrap_err();
        let by_state = service
            .get_devices_by_state(&GetDevicesByStateRequest {
                state: DeviceState::Available,
            })
            .await
            .unwrap_err();

        assert_error(all, ErrorKind::FetchError, 500);
        assert_error(by_brand, ErrorKind::FetchError, 500);
        assert_error(by_state, ErrorKind::FetchError, 500);
    }

    #[tokio::test]
    async fn test_get_device_by_id_errors() {
        let service = Service::new(MemoryRepository::default());
        let result = service
            .get_device_by_id(&GetDeviceByIdRequest {
                id: DeviceId::new(999_999),
            })
            .await
            .unwrap_err();
        assert_error(result, ErrorKind::NotFound, 404);

        let service = Service::new(MemoryRepository::failing_reads());
        let result = service
            .get_device_by_id(&GetDeviceByIdRequest {
                id: DeviceId::new(1),
            })
            .await
            .unwrap_err();
        assert_error(result, ErrorKind::GetByIdError, 500);
    }

    #[tokio::test]
    async fn test_delete_device_in_use_forbidden() {
        let repo = MemoryRepository::default();
        let device = repo.seed("Pixel", "Google", DeviceState::InUse);
        let service = Service::new(repo.clone());

        let result = service
            .delete_device(&DeleteDeviceRequest { id: device.id() })
            .await
            .unwrap_err();

        assert_error(result, ErrorKind::DeleteError, 403);
        assert_eq!(repo.stored(device.id()), Some(device));
    }

    #[tokio::test]
    async fn test_delete_device_success() {
        for state in [DeviceState::Available, DeviceState::Inactive] {
            let repo = MemoryRepository::default();
            let device = repo.seed("Pixel", "Google", state);
            let service = Service::new(repo);

            service
                .delete_device(&DeleteDeviceRequest { id: device.id() })
                .await
                .unwrap();

            let result = service
                .get_device_by_id(&GetDeviceByIdRequest { id: device.id() })
                .await
                .unwrap_err();
            assert_error(result, ErrorKind::NotFound, 404);
        }
    }

    #[tokio::test]
    async fn test_delete_device_errors() {
        let service = Service::new(MemoryRepository::default());
        let result = service
            .delete_device(&DeleteDeviceRequest {
                id: DeviceId::new(5),
            })
            .await
            .unwrap_err();
        assert_error(result, ErrorKind::NotFound, 404);

        let service = Service::new(MemoryRepository::failing_reads());
        let result = service
            .delete_device(&DeleteDeviceRequest {
                id: DeviceId::new(5),
            })
            .await
            .unwrap_err();
        assert_error(result, ErrorKind::DeleteError, 500);

        let repo = MemoryRepository::failing_writes();
        let device = repo.seed("Pixel", "Google", DeviceState::Inactive);
        let service = Service::new(repo);
        let result = service
            .delete_device(&DeleteDeviceRequest { id: device.id() })
            .await
            .unwrap_err();
        assert_error(result, ErrorKind::DeleteError, 500);
    }
}
