use std::str::FromStr;

use agora_core::AppError;
use serde::{Deserialize, Serialize};

use crate::AssociationRole;

/// Actions inside an association that are gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Allows opening the association admin panel.
    ViewAdminPanel,
    /// Allows publishing a new post.
    CreatePost,
    /// Allows editing any post.
    EditPost,
    /// Allows deleting any post.
    DeletePost,
    /// Allows pinning a post to the top of the feed.
    PinPost,
    /// Allows scheduling a new event.
    CreateEvent,
    /// Allows editing any event.
    EditEvent,
    /// Allows deleting any event.
    DeleteEvent,
    /// Allows accepting, removing and promoting members.
    ManageMembers,
    /// Allows editing the association profile.
    EditAssociationInfo,
    /// Allows granting and revoking the admin role.
    ManageAdmins,
    /// Allows deleting the association.
    DeleteAssociation,
}

impl Capability {
    /// Returns a stable storage value for this capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewAdminPanel => "admin_panel.view",
            Self::CreatePost => "post.create",
            Self::EditPost => "post.edit",
            Self::DeletePost => "post.delete",
            Self::PinPost => "post.pin",
            Self::CreateEvent => "event.create",
            Self::EditEvent => "event.edit",
            Self::DeleteEvent => "event.delete",
            Self::ManageMembers => "members.manage",
            Self::EditAssociationInfo => "association.edit",
            Self::ManageAdmins => "admins.manage",
            Self::DeleteAssociation => "association.delete",
        }
    }

    /// Returns all known capabilities.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Capability] = &[
            Capability::ViewAdminPanel,
            Capability::CreatePost,
            Capability::EditPost,
            Capability::DeletePost,
            Capability::PinPost,
            Capability::CreateEvent,
            Capability::EditEvent,
            Capability::DeleteEvent,
            Capability::ManageMembers,
            Capability::EditAssociationInfo,
            Capability::ManageAdmins,
            Capability::DeleteAssociation,
        ];

        ALL
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|capability| capability.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown capability value '{value}'")))
    }
}

/// Flat set of capability flags derived from one role.
///
/// Only [`CapabilitySet::for_role`] builds a set, so every instance matches
/// the role table exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySet {
    view_admin_panel: bool,
    create_post: bool,
    edit_post: bool,
    delete_post: bool,
    pin_post: bool,
    create_event: bool,
    edit_event: bool,
    delete_event: bool,
    manage_members: bool,
    edit_association_info: bool,
    manage_admins: bool,
    delete_association: bool,
}

impl CapabilitySet {
    /// Derives the capability flags granted by a role.
    #[must_use]
    pub fn for_role(role: AssociationRole) -> Self {
        let (staff, manager, owner) = match role {
            AssociationRole::President => (true, true, true),
            AssociationRole::Admin => (true, true, false),
            AssociationRole::Editor => (true, false, false),
            AssociationRole::None => (false, false, false),
        };

        Self {
            view_admin_panel: staff,
            create_post: staff,
            edit_post: manager,
            delete_post: manager,
            pin_post: manager,
            create_event: manager,
            edit_event: manager,
            delete_event: manager,
            manage_members: manager,
            edit_association_info: manager,
            manage_admins: owner,
            delete_association: owner,
        }
    }

    /// Returns the empty set granted when no role is assigned.
    #[must_use]
    pub fn none() -> Self {
        Self::for_role(AssociationRole::None)
    }

    /// Returns whether the set grants a capability.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewAdminPanel => self.view_admin_panel,
            Capability::CreatePost => self.create_post,
            Capability::EditPost => self.edit_post,
            Capability::DeletePost => self.delete_post,
            Capability::PinPost => self.pin_post,
            Capability::CreateEvent => self.create_event,
            Capability::EditEvent => self.edit_event,
            Capability::DeleteEvent => self.delete_event,
            Capability::ManageMembers => self.manage_members,
            Capability::EditAssociationInfo => self.edit_association_info,
            Capability::ManageAdmins => self.manage_admins,
            Capability::DeleteAssociation => self.delete_association,
        }
    }

    /// Lists granted capabilities in declaration order.
    #[must_use]
    pub fn granted(&self) -> Vec<Capability> {
        Capability::all()
            .iter()
            .copied()
            .filter(|capability| self.allows(*capability))
            .collect()
    }

    /// Can open the admin panel.
    #[must_use]
    pub fn view_admin_panel(&self) -> bool {
        self.view_admin_panel
    }

    /// Can publish posts.
    #[must_use]
    pub fn create_post(&self) -> bool {
        self.create_post
    }

    /// Can edit posts.
    #[must_use]
    pub fn edit_post(&self) -> bool {
        self.edit_post
    }

    /// Can delete posts.
    #[must_use]
    pub fn delete_post(&self) -> bool {
        self.delete_post
    }

    /// Can pin posts.
    #[must_use]
    pub fn pin_post(&self) -> bool {
        self.pin_post
    }

    /// Can create events.
    #[must_use]
    pub fn create_event(&self) -> bool {
        self.create_event
    }

    /// Can edit events.
    #[must_use]
    pub fn edit_event(&self) -> bool {
        self.edit_event
    }

    /// Can delete events.
    #[must_use]
    pub fn delete_event(&self) -> bool {
        self.delete_event
    }

    /// Can manage members.
    #[must_use]
    pub fn manage_members(&self) -> bool {
        self.manage_members
    }

    /// Can edit the association profile.
    #[must_use]
    pub fn edit_association_info(&self) -> bool {
        self.edit_association_info
    }

    /// Can grant or revoke the admin role.
    #[must_use]
    pub fn manage_admins(&self) -> bool {
        self.manage_admins
    }

    /// Can delete the association.
    #[must_use]
    pub fn delete_association(&self) -> bool {
        self.delete_association
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::none()
    }
}
