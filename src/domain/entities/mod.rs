//! # Domain Entities
//!
//! Platform objects the framework reasons about. They are snapshots handed
//! over by the chat platform; the framework never persists them itself.
//!
//! ## Core Entities
//!
//! - **User**: a platform account (people and bots)
//! - **Guild**: a community with an owner, members and roles
//! - **Member**: a user's membership in a specific guild
//! - **Role**: a named grant target inside a guild
//! - **Channel**: a text channel or direct-message conversation
//! - **Message**: an inbound chat message
//!
//! ## Repository Traits
//!
//! `GuildDataRepository` is the persistence port for per-guild key/value
//! data. Implementations live in the infrastructure layer.

mod channel;
mod guild;
mod member;
mod message;
mod role;
mod user;

pub use channel::{Channel, ChannelType};
pub use guild::{Guild, GuildDataRepository};
#[cfg(test)]
pub use guild::MockGuildDataRepository;
pub use member::Member;
pub use message::Message;
pub use role::Role;
pub use user::User;
