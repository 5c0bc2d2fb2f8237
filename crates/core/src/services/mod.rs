//! Rank-gated operations on dashboards and widgets.
//!
//! Each operation checks the caller's rank first, performs its writes in one
//! unit of work, and publishes a change record only after commit.

pub mod dashboard;
pub mod widget;

pub use dashboard::DashboardService;
pub use widget::WidgetService;
