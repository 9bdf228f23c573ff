pub mod network;
pub mod config;
pub mod error;
pub mod utils;

pub use error::{MetanetError, Result};
pub use config::Config;
