//! HTTP surface: gates, rate limiting, routes and server

pub mod auth;
pub mod error;
pub mod rate_limit;
pub mod routes;
mod server;

pub use error::GateError;
pub use server::{ApiContext, ApiServer, router};
