//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **Snowflake**: platform-assigned 64-bit identifier
//! - **Embed**: structured rich message payload

mod embed;
mod snowflake;

pub use embed::*;
pub use snowflake::*;
