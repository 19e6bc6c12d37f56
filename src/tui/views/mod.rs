//! TUI Views module

mod job_tree;

pub use job_tree::{JobTreeView, status_color};
