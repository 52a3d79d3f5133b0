//! Gateway between the Academic Assistant UI and its agent backend.

pub mod api;
pub mod backend;
pub mod config;
pub mod models;
pub mod relay;
