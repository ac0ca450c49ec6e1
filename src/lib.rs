//! Finds the rows of a household expense sheet whose category lookup failed, asks for each
//! missing category over a chat bot, and appends every answer to the sheet's mapping table.

mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
mod resolve;
mod utils;


pub use api::{Mode, TEST_MODE_ENV};
pub use config::Config;
pub use error::Error;
pub use error::Result;
