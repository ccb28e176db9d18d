//! Builds and execs the interactive `ssh` child.

use std::process;

use tracing::error;

use super::{bounded_arg, exec_program, LaunchError};
use crate::config::Config;

pub const SHELL_PROGRAM: &str = "ssh";

/// Shell argument vector, excluding the program name. The connection always
/// targets localhost, through the tunnel's local port; the host token is
/// prefixed with `user@` only when a login name was configured.
pub fn argv(config: &Config) -> Result<Vec<String>, LaunchError> {
    let host = match &config.username {
        Some(user) => bounded_arg("login", format!("{user}@localhost"))?,
        None => "localhost".to_string(),
    };
    Ok(vec![host, "-p".to_string(), config.local_port.to_string()])
}

/// Child-side entry: replaces this process with ssh, leaving all three
/// standard streams attached to the controlling terminal so the user talks
/// to the remote session directly. Never returns.
pub fn exec(config: &Config) -> ! {
    let err = match argv(config) {
        Ok(args) => exec_program(SHELL_PROGRAM, &args),
        Err(err) => err,
    };
    error!("ssh launch failed: {err}");
    process::exit(1);
}
