//! HTTP surface over [`crate::workflow::Workflow`].

pub mod model;
pub mod routes;

pub use routes::{AppState, router};
