//! Application Services
//!
//! The service registry and the core services every bot registers under
//! the `core` namespace.
//!
//! ## Core Services
//!
//! - **DataService**: per-guild key/value persistence with per-key locking
//! - **ModuleService**: module enablement and default data
//! - **CommandService**: command registry, prefixes, enablement, dispatch
//! - **ConfigActionService**: per-module config actions
//! - **PermissionsService**: permission levels and grants
//! - **UserService**: member and role lookup from free text

pub mod command_service;
pub mod config_action_service;
pub mod data_service;
pub mod module_service;
pub mod permissions_service;
pub mod registry;
pub mod user_service;

pub use command_service::{CommandService, DispatchOutcome, FilterOutcome, HaltReason};
pub use config_action_service::ConfigActionService;
pub use data_service::DataService;
pub use module_service::ModuleService;
pub use permissions_service::PermissionsService;
pub use registry::{Service, ServiceClass, ServiceEntry, ServiceInstance, ServiceRegistry};
pub use user_service::UserService;

/// Namespace the core services are registered under.
pub const CORE_NAMESPACE: &str = "core";
