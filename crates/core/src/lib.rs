pub mod config;
pub mod error;
pub mod logging;

pub mod features;
pub mod index;
pub mod model;
pub mod reconcile;
pub mod runtime;

pub use config::DcfConfig;
pub use error::{DcfError, InvocationError, Result};
