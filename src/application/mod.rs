mod config;
pub mod error;
mod reporting;
mod service;

pub use config::*;
pub use error::*;
pub use reporting::*;
pub use service::*;
