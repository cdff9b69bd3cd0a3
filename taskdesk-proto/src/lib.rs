//! Shared wire definitions for the `TaskDesk` REST backend.
//!
//! Entities, request bodies and endpoint paths as the backend speaks them
//! (JSON over HTTP). Nothing here performs I/O.

pub mod endpoint;
pub mod model;
pub mod request;
pub mod time;
