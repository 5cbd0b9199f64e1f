use std::str::FromStr;

use agora_core::AppError;
use serde::{Deserialize, Serialize};

use crate::CapabilitySet;

/// Role held by a user within one association.
///
/// The membership store only ever holds the three assigned tiers; `None`
/// stands for "no administrative role" and is also the fallback for any
/// value this client does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationRole {
    /// Founder or elected head of the association.
    President,
    /// Delegated administrator.
    Admin,
    /// Member allowed to publish posts.
    Editor,
    /// No administrative role assigned.
    #[default]
    None,
}

impl AssociationRole {
    /// Returns every role state, including `None`.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AssociationRole] = &[
            AssociationRole::President,
            AssociationRole::Admin,
            AssociationRole::Editor,
            AssociationRole::None,
        ];

        ALL
    }

    /// Returns the stable storage value, or `None` when no role is assigned.
    #[must_use]
    pub fn storage_value(&self) -> Option<&'static str> {
        match self {
            Self::President => Some("president"),
            Self::Admin => Some("admin"),
            Self::Editor => Some("editor"),
            Self::None => None,
        }
    }

    /// Maps a raw value read from the membership store to a role.
    ///
    /// Missing and unrecognised values yield [`AssociationRole::None`].
    #[must_use]
    pub fn from_store_value(value: Option<&str>) -> Self {
        value
            .and_then(|raw| Self::from_str(raw).ok())
            .unwrap_or(Self::None)
    }

    /// Returns the capabilities granted by this role.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::for_role(*self)
    }

    /// Returns whether the role grants any administrative capability.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Human-readable role name shown next to a member.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::President => "President",
            Self::Admin => "Administrator",
            Self::Editor => "Editor",
            Self::None => "Member",
        }
    }

    /// Icon glyph name used to badge the role.
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            Self::President => "star",
            Self::Admin => "shield-checkmark",
            Self::Editor => "create",
            Self::None => "person",
        }
    }

    /// One-line summary of what the role may do.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::President => "Full control over the association",
            Self::Admin => "Manages posts, events and members",
            Self::Editor => "Can publish posts",
            Self::None => "No administrative rights",
        }
    }
}

impl FromStr for AssociationRole {
    type Err = AppError;

    /// Strict parse of an assigned role; `"none"` and unknown values are errors.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "president" => Ok(Self::President),
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            _ => Err(AppError::Validation(format!(
                "unknown association role '{value}'"
            ))),
        }
    }
}

impl std::fmt::Display for AssociationRole {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.storage_value().unwrap_or("none"))
    }
}
