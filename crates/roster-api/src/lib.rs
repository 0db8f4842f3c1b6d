//! Roster API Library
//!
//! HTTP handlers, bearer-token authentication and application setup for the
//! membership provisioning service.

mod api_doc;
mod handlers;
mod telemetry;
mod utils;

pub mod auth;
pub mod constants;
pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
