#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation
)]

pub mod config;
pub mod error;
pub mod family;
pub mod gateway;
pub mod llm;
pub mod providers;

pub use config::Config;
pub use error::{ApiError, BackendError, ConfigError, ParseError};
