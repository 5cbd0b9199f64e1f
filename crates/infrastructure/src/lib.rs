//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod file_device_store;
mod hosted_backend;
mod http_identity_provider;
mod in_memory_device_store;
mod in_memory_membership_role_repository;
mod postgres_membership_role_repository;
mod postgrest_membership_role_repository;

pub use file_device_store::FileDeviceStore;
pub use hosted_backend::HostedBackend;
pub use http_identity_provider::HttpIdentityProvider;
pub use in_memory_device_store::InMemoryDeviceStore;
pub use in_memory_membership_role_repository::InMemoryMembershipRoleRepository;
pub use postgres_membership_role_repository::PostgresMembershipRoleRepository;
pub use postgrest_membership_role_repository::PostgrestMembershipRoleRepository;
