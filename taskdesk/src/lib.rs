//! `TaskDesk` - lead and member dashboards for a team task tracker.
//!
//! Core library: session guard, REST backend access, view derivations,
//! HTML rendering, action dispatch, notification polling and
//! configuration. The `taskdesk` binary wires these together behind a
//! command-line interface.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod dispatch;
pub mod error;
pub mod poll;
pub mod render;
pub mod session;
pub mod toast;
pub mod view;
