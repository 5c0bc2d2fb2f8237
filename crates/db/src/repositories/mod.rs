pub mod access_right_repo;
pub mod dashboard_repo;
pub mod event_repo;
pub mod widget_repo;

pub use access_right_repo::AccessRightRepo;
pub use dashboard_repo::DashboardRepo;
pub use event_repo::EventRepo;
pub use widget_repo::WidgetRepo;
