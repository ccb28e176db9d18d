use thiserror::Error;

use crate::config::ConfigError;
use crate::launch::LaunchError;
use crate::supervisor::SupervisorError;

#[derive(Error, Debug)]
pub enum GcpShellError {
    #[error("invalid arguments: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

pub type Result<T> = std::result::Result<T, GcpShellError>;
