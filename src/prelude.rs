pub use crate::base::{
    config::Config,
    types::{Err, Excuse, ExcuseError, ExcuseResult, Res, Severity, Void},
};
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};
