//! Change-event fan-out for dashboard and widget mutations.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, and the [`ChangeNotifier`] the services
//!   publish to.
//! - [`EventOutbox`]: background subscriber that writes every record to the
//!   `change_events` table.
//!
//! [`ChangeNotifier`]: nsi_core::notify::ChangeNotifier

pub mod bus;
pub mod outbox;

pub use bus::EventBus;
pub use outbox::EventOutbox;
