pub mod create_device;
pub mod delete_device;
pub mod get_device;
pub mod get_devices;
pub mod get_devices_by_brand;
pub mod get_devices_by_state;
pub mod patch_device;
pub mod update_device;
