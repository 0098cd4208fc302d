//! HTTP gateway: the axum API surface, CLI, and startup wiring around
//! the workflow engine.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod state;
