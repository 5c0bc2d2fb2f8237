//! Widget domain model and inputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::rank::Rank;
use crate::types::DbId;

/// Closed set of widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Square,
}

impl WidgetType {
    pub const fn as_str(self) -> &'static str {
        match self {
            WidgetType::Square => "square",
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square" => Ok(WidgetType::Square),
            other => Err(CoreError::Validation(format!(
                "Unknown widget type: '{other}'. Valid types: square"
            ))),
        }
    }
}

/// A widget owned by exactly one dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub id: DbId,
    pub name: String,
    pub dashboard_id: DbId,
    pub widget_type: WidgetType,
    /// Opaque layout/position blob, stored as given.
    pub config: String,
}

/// A widget with the requesting user's effective rank on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetAccess {
    #[serde(flatten)]
    pub widget: Widget,
    pub rank: Rank,
}

/// Input for creating a widget.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWidget {
    pub name: String,
    pub dashboard_id: DbId,
    pub widget_type: WidgetType,
    #[serde(default)]
    pub config: String,
}

/// Patch for a widget. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WidgetUpdate {
    pub name: Option<String>,
    pub config: Option<String>,
}

impl WidgetUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.config.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_type_round_trips_through_storage_name() {
        assert_eq!("square".parse::<WidgetType>().unwrap(), WidgetType::Square);
        assert!("circle".parse::<WidgetType>().is_err());
    }

    #[test]
    fn new_widget_config_defaults_to_empty() {
        let input: NewWidget = serde_json::from_value(serde_json::json!({
            "name": "Chart",
            "dashboard_id": 7,
            "widget_type": "square"
        }))
        .unwrap();
        assert_eq!(input.config, "");
        assert_eq!(input.widget_type, WidgetType::Square);
    }

    #[test]
    fn empty_update_detected() {
        assert!(WidgetUpdate::default().is_empty());
        let update = WidgetUpdate {
            config: Some("{\"x\":1}".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
