//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod capability;
mod role;
mod user;

pub use capability::{Capability, CapabilitySet};
pub use role::AssociationRole;
pub use user::{EmailAddress, PASSWORD_MAX_LENGTH, UserId, validate_sign_in_password};
