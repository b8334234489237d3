pub mod device;
pub mod requests;
