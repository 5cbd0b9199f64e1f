use agora_core::AssociationId;
use agora_domain::{AssociationRole, CapabilitySet, UserId};

/// The (subject, association) pair a resolution runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolutionRequest {
    subject: UserId,
    association_id: AssociationId,
}

impl ResolutionRequest {
    /// Creates a request for a subject within an association.
    #[must_use]
    pub fn new(subject: UserId, association_id: AssociationId) -> Self {
        Self {
            subject,
            association_id,
        }
    }

    /// Builds a request only when both sides are known.
    #[must_use]
    pub fn from_parts(
        subject: Option<UserId>,
        association_id: Option<AssociationId>,
    ) -> Option<Self> {
        Some(Self::new(subject?, association_id?))
    }

    /// Returns the subject being resolved.
    #[must_use]
    pub fn subject(&self) -> UserId {
        self.subject
    }

    /// Returns the association being resolved.
    #[must_use]
    pub fn association_id(&self) -> AssociationId {
        self.association_id
    }
}

/// Lifecycle of the most recent resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionStatus {
    /// No (subject, association) pair is set.
    #[default]
    Idle,
    /// A lookup for the current pair is in flight.
    Loading,
    /// The lookup completed; the role reflects the store (possibly `None`).
    Resolved,
    /// The lookup failed; the role fell back to `None`.
    Failed,
}

/// Read-only view of the resolver state published to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionSnapshot {
    pub(super) request: Option<ResolutionRequest>,
    pub(super) role: AssociationRole,
    pub(super) status: ResolutionStatus,
    pub(super) generation: u64,
}

impl PermissionSnapshot {
    /// Returns the pair this snapshot belongs to.
    #[must_use]
    pub fn request(&self) -> Option<ResolutionRequest> {
        self.request
    }

    /// Returns the resolved role.
    #[must_use]
    pub fn role(&self) -> AssociationRole {
        self.role
    }

    /// Returns the capabilities derived from the resolved role.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        self.role.capabilities()
    }

    /// Returns the resolution status.
    #[must_use]
    pub fn status(&self) -> ResolutionStatus {
        self.status
    }

    /// Returns whether a lookup is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == ResolutionStatus::Loading
    }

    /// Returns whether the last lookup failed rather than finding no role.
    #[must_use]
    pub fn lookup_failed(&self) -> bool {
        self.status == ResolutionStatus::Failed
    }
}
