//! Role resolution for a subject within an association.
//!
//! The resolver fetches one role row from the membership store and publishes
//! the derived capabilities through a `watch` channel. Each resolution takes
//! a generation token when it starts; a completion whose token is no longer
//! current is dropped, so the latest request always wins regardless of the
//! order in which lookups finish.

use std::sync::Arc;

use agora_core::AssociationId;
use agora_domain::{AssociationRole, UserId};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::MembershipRoleRepository;

mod snapshot;

pub use snapshot::{PermissionSnapshot, ResolutionRequest, ResolutionStatus};

/// Resolves and holds the current subject's role in one association.
#[derive(Clone)]
pub struct PermissionResolver {
    repository: Arc<dyn MembershipRoleRepository>,
    state: Arc<watch::Sender<PermissionSnapshot>>,
}

impl PermissionResolver {
    /// Creates a resolver with no pair set.
    #[must_use]
    pub fn new(repository: Arc<dyn MembershipRoleRepository>) -> Self {
        let (state, _) = watch::channel(PermissionSnapshot::default());
        Self {
            repository,
            state: Arc::new(state),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn snapshot(&self) -> PermissionSnapshot {
        self.state.borrow().clone()
    }

    /// Returns a receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PermissionSnapshot> {
        self.state.subscribe()
    }

    /// Points the resolver at a (subject, association) pair.
    ///
    /// A missing side clears the state without touching the store. Passing
    /// the pair that is already current is a no-op; use
    /// [`PermissionResolver::refresh`] to force a new lookup.
    pub async fn resolve(
        &self,
        subject: Option<UserId>,
        association_id: Option<AssociationId>,
    ) -> PermissionSnapshot {
        let Some(request) = ResolutionRequest::from_parts(subject, association_id) else {
            self.clear();
            return self.snapshot();
        };

        let current = self.snapshot();
        if current.request == Some(request) && current.status != ResolutionStatus::Idle {
            return current;
        }

        let generation = self.begin(request);
        self.run(request, generation).await
    }

    /// Repeats the lookup for the current pair, keeping the previous role
    /// visible until the new result lands.
    pub async fn refresh(&self) -> PermissionSnapshot {
        let Some(request) = self.snapshot().request else {
            return self.snapshot();
        };

        let generation = self.begin(request);
        self.run(request, generation).await
    }

    /// Drops the current pair and discards any lookup still in flight.
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            let changed = state.request.is_some()
                || state.role != AssociationRole::None
                || state.status != ResolutionStatus::Idle;

            state.generation = state.generation.wrapping_add(1);
            state.request = None;
            state.role = AssociationRole::None;
            state.status = ResolutionStatus::Idle;
            changed
        });
    }

    fn begin(&self, request: ResolutionRequest) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation = state.generation.wrapping_add(1);
            generation = state.generation;

            if state.request != Some(request) {
                state.role = AssociationRole::None;
            }
            state.request = Some(request);
            state.status = ResolutionStatus::Loading;
        });
        generation
    }

    async fn run(&self, request: ResolutionRequest, generation: u64) -> PermissionSnapshot {
        debug!(
            subject = %request.subject(),
            association_id = %request.association_id(),
            generation,
            "resolving association role"
        );

        let (role, status) = match self
            .repository
            .find_role(request.association_id(), request.subject())
            .await
        {
            Ok(stored) => (
                parse_stored_role(stored.as_deref(), &request),
                ResolutionStatus::Resolved,
            ),
            Err(error) => {
                warn!(
                    subject = %request.subject(),
                    association_id = %request.association_id(),
                    error = %error,
                    "association role lookup failed, falling back to no role"
                );
                (AssociationRole::None, ResolutionStatus::Failed)
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }

            state.role = role;
            state.status = status;
            true
        });

        if !applied {
            debug!(
                subject = %request.subject(),
                association_id = %request.association_id(),
                generation,
                "discarded stale association role result"
            );
        }

        self.snapshot()
    }
}

fn parse_stored_role(stored: Option<&str>, request: &ResolutionRequest) -> AssociationRole {
    let role = AssociationRole::from_store_value(stored);

    if let (Some(raw), AssociationRole::None) = (stored, role) {
        warn!(
            subject = %request.subject(),
            association_id = %request.association_id(),
            stored_role = raw,
            "unrecognised association role, treating as no role"
        );
    }

    role
}

#[cfg(test)]
mod tests;
