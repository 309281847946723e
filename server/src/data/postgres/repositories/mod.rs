//! Query functions for the PostgreSQL store

pub mod post;
pub mod role;
pub mod user;
