//! Dashboard domain model and inputs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::rank::Rank;
use crate::types::DbId;

/// Maximum length of a dashboard or widget name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// A dashboard, optionally nested under a parent dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
}

/// A dashboard together with the requesting user's direct rank on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardAccess {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    pub rank: Rank,
}

/// Input for creating a dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDashboard {
    pub name: String,
    pub parent_id: Option<DbId>,
}

/// Validate a dashboard or widget name: non-blank and at most
/// [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_accepted() {
        assert!(validate_name("Sales").is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn blank_or_oversized_names_rejected() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn access_listing_flattens_dashboard_fields() {
        let access = DashboardAccess {
            dashboard: Dashboard {
                id: 7,
                name: "Sales".into(),
                parent_id: None,
            },
            rank: Rank::Admin,
        };
        let json = serde_json::to_value(&access).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Sales");
        assert_eq!(json["rank"], "admin");
    }
}
