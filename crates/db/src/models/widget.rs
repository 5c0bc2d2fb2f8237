//! Row shapes for the `widgets` table.

use nsi_core::error::CoreError;
use nsi_core::rank::Rank;
use nsi_core::types::DbId;
use nsi_core::widget::Widget;
use sqlx::FromRow;

/// A row from the `widgets` table.
#[derive(Debug, Clone, FromRow)]
pub struct WidgetRow {
    pub id: DbId,
    pub name: String,
    pub dashboard_id: DbId,
    pub widget_type: String,
    pub config: String,
}

impl TryFrom<WidgetRow> for Widget {
    type Error = CoreError;

    fn try_from(row: WidgetRow) -> Result<Self, Self::Error> {
        Ok(Widget {
            id: row.id,
            name: row.name,
            dashboard_id: row.dashboard_id,
            widget_type: row.widget_type.parse()?,
            config: row.config,
        })
    }
}

/// A widget with one user's direct access right rank on it, if any.
#[derive(Debug, Clone, FromRow)]
pub struct WidgetRankRow {
    #[sqlx(flatten)]
    pub widget: WidgetRow,
    pub rank: Option<String>,
}

impl WidgetRankRow {
    pub fn into_parts(self) -> Result<(Widget, Option<Rank>), CoreError> {
        let rank = self.rank.as_deref().map(str::parse::<Rank>).transpose()?;
        Ok((Widget::try_from(self.widget)?, rank))
    }
}
