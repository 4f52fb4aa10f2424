//! Commands module - service layer for provisioner operations

mod apply;
mod destroy;
mod plan;
pub(crate) mod service;
mod verify;

pub use plan::inline_policy_name;
pub use service::ProvisionerService;
