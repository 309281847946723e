//! API route handlers

pub mod health;
pub mod posts;
pub mod users;
