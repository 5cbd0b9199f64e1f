//! Application services and ports.

#![forbid(unsafe_code)]

mod auth_session_service;
mod membership_ports;
mod permission_resolver;
mod session_ports;

pub use auth_session_service::{AuthSessionService, LaunchRoute};
pub use membership_ports::MembershipRoleRepository;
pub use permission_resolver::{
    PermissionResolver, PermissionSnapshot, ResolutionRequest, ResolutionStatus,
};
pub use session_ports::{AuthSession, DeviceStore, IdentityProvider};
