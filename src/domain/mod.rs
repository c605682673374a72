//! # Domain Layer
//!
//! Platform entities, value objects, pure domain services and the ports the
//! framework talks to the outside world through.
//!
//! ## Structure
//!
//! - **entities**: platform snapshots (User, Guild, Member, Role, Channel, Message)
//! - **value_objects**: immutable value types (Snowflake, Embed)
//! - **services**: domain services for permission evaluation
//! - **platform**: the chat platform port and its event/outbound types
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or application layers
//! - Repository and platform traits define the external contracts
//! - Entities encapsulate small domain behavior (ownership, mentions)

pub mod entities;
pub mod platform;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use platform::*;
pub use value_objects::*;
