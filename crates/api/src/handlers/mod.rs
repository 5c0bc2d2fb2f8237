pub mod dashboard;
pub mod rights;
pub mod widget;
