//! Terminal User Interface module for cimon
//!
//! A keyboard-driven dashboard over the refresh task: a collapsible job tree
//! with live search, column sorting and toast notifications for refresh
//! failures.

#[cfg(feature = "tui")]
mod app;
#[cfg(feature = "tui")]
mod notifications;
#[cfg(feature = "tui")]
mod views;

#[cfg(feature = "tui")]
pub use app::{AppRequest, TuiApp, run_tui};
#[cfg(feature = "tui")]
pub use notifications::{NotificationLevel, NotificationManager, Toast};
#[cfg(feature = "tui")]
pub use views::{JobTreeView, status_color};
