//! # Domain Services
//!
//! Stateless domain logic that does not belong to a single entity.
//!
//! - **PermissionService**: permission-level grant evaluation

mod permission_service;

pub use permission_service::{PermissionLevelData, PermissionService};
