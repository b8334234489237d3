use std::future::Future;

use crate::domain::device::models::device::{
    Device, DeviceId, DeviceState, NewDevice, RepositoryError,
};
use crate::domain::device::models::requests::{
    CreateDeviceRequest, DeleteDeviceRequest, GetDeviceByIdRequest, GetDevicesByBrandRequest,
    GetDevicesByStateRequest, PatchDeviceRequest, UpdateDeviceRequest,
};
use crate::domain::error::Error;

/// `DeviceService` is the public API for the device domain.
///
/// Mutating operations re-read the stored device and evaluate their rules against that record.
pub trait DeviceService: Clone + Send + Sync + 'static {
    fn create_device(
        &self,
        req: &CreateDeviceRequest,
    ) -> impl Future<Output = Result<Device, Error>> + Send;

    fn update_device(
        &self,
        req: &UpdateDeviceRequest,
    ) -> impl Future<Output = Result<Device, Error>> + Send;

    fn patch_device(
        &self,
        req: &PatchDeviceRequest,
    ) -> impl Future<Output = Result<Device, Error>> + Send;

    fn get_all_devices(&self) -> impl Future<Output = Result<Vec<Device>, Error>> + Send;

    fn get_device_by_id(
        &self,
        req: &GetDeviceByIdRequest,
    ) -> impl Future<Output = Result<Device, Error>> + Send;

    fn get_devices_by_brand(
        &self,
        req: &GetDevicesByBrandRequest,
    ) -> impl Future<Output = Result<Vec<Device>, Error>> + Send;

    fn get_devices_by_state(
        &self,
        req: &GetDevicesByStateRequest,
    ) -> impl Future<Output = Result<Vec<Device>, Error>> + Send;

    fn delete_device(
        &self,
        req: &DeleteDeviceRequest,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// `DeviceRepository` represents a store of device data.
///
/// Lookups and writes addressing a single device report a missing row as
/// [RepositoryError::NotFound]; every other failure is [RepositoryError::Unknown].
pub trait DeviceRepository: Send + Sync + Clone + 'static {
    fn create_device(
        &self,
        device: &NewDevice,
    ) -> impl Future<Output = Result<Device, RepositoryError>> + Send;

    /// Persists name, brand and state. Creation time is never written.
    fn update_device(
        &self,
        device: &Device,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn get_all_devices(&self) -> impl Future<Output = Result<Vec<Device>, RepositoryError>> + Send;

    fn get_device_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Device, RepositoryError>> + Send;

    fn get_devices_by_brand(
        &self,
        brand: &str,
    ) -> impl Future<Output = Result<Vec<Device>, RepositoryError>> + Send;

    fn get_devices_by_state(
        &self,
        state: DeviceState,
    ) -> impl Future<Output = Result<Vec<Device>, RepositoryError>> + Send;

    fn delete_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
