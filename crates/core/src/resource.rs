//! References to the two kinds of access-controlled resources.
//!
//! Inbound operations name "a dashboard or a widget" with a pair of optional
//! ids. [`ResourceRef::from_parts`] is the one place that pair is turned into
//! a tagged reference; everything past the boundary works with the enum.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::AccessError;
use crate::types::DbId;

/// Which association table a grant is bound through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Dashboard,
    Widget,
}

impl ResourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Dashboard => "dashboard",
            ResourceKind::Widget => "widget",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one dashboard or one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ResourceRef {
    Dashboard(DbId),
    Widget(DbId),
}

impl ResourceRef {
    /// Build a reference from the optional id pair used on the wire.
    ///
    /// Fails with [`AccessError::InvalidReference`] unless exactly one id is
    /// present.
    pub fn from_parts(
        dashboard_id: Option<DbId>,
        widget_id: Option<DbId>,
    ) -> Result<Self, AccessError> {
        match (dashboard_id, widget_id) {
            (Some(id), None) => Ok(ResourceRef::Dashboard(id)),
            (None, Some(id)) => Ok(ResourceRef::Widget(id)),
            (None, None) => Err(AccessError::InvalidReference(
                "either dashboard_id or widget_id is required".into(),
            )),
            (Some(_), Some(_)) => Err(AccessError::InvalidReference(
                "dashboard_id and widget_id are mutually exclusive".into(),
            )),
        }
    }

    pub const fn kind(self) -> ResourceKind {
        match self {
            ResourceRef::Dashboard(_) => ResourceKind::Dashboard,
            ResourceRef::Widget(_) => ResourceKind::Widget,
        }
    }

    pub const fn id(self) -> DbId {
        match self {
            ResourceRef::Dashboard(id) | ResourceRef::Widget(id) => id,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn exactly_one_id_builds_a_reference() {
        assert_eq!(
            ResourceRef::from_parts(Some(7), None).unwrap(),
            ResourceRef::Dashboard(7)
        );
        assert_eq!(
            ResourceRef::from_parts(None, Some(42)).unwrap(),
            ResourceRef::Widget(42)
        );
    }

    #[test]
    fn neither_id_is_rejected() {
        assert_matches!(
            ResourceRef::from_parts(None, None),
            Err(AccessError::InvalidReference(_))
        );
    }

    #[test]
    fn both_ids_are_rejected() {
        assert_matches!(
            ResourceRef::from_parts(Some(7), Some(42)),
            Err(AccessError::InvalidReference(_))
        );
    }

    #[test]
    fn display_names_kind_and_id() {
        assert_eq!(ResourceRef::Widget(42).to_string(), "widget 42");
        assert_eq!(ResourceRef::Dashboard(7).kind(), ResourceKind::Dashboard);
    }
}
