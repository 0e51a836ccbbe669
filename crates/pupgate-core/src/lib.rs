pub mod aggregate;
pub mod checker;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod git;
pub mod install;
pub mod preflight;
pub mod snapshot;
pub mod types;

pub use aggregate::check_files;
pub use config::GateConfig;
pub use dispatch::Registry;
pub use error::GateError;
pub use types::*;
