pub mod access_right;
pub mod dashboard;
pub mod event;
pub mod widget;
