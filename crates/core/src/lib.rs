//! Domain core of the dashboard access-control service.
//!
//! Dashboards and widgets are guarded by ranked grants. [`access`] holds the
//! resolution and mutation engine together with the store contract it runs
//! against; [`services`] wraps resource operations with the rank checks and
//! ownership seeding they require.

pub mod access;
pub mod dashboard;
pub mod error;
pub mod grant;
pub mod notify;
pub mod rank;
pub mod resource;
pub mod services;
pub mod types;
pub mod widget;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
