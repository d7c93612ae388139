pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod help;
pub mod link;
pub mod sheets;

pub use error::{Error, Result};
