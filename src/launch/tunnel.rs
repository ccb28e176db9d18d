//! Builds and execs the `gcloud compute start-iap-tunnel` child.

use std::process;

use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;
use tracing::error;

use super::{bounded_arg, exec_program, LaunchError};
use crate::config::Config;

pub const TUNNEL_PROGRAM: &str = "gcloud";

/// IAP forwards to the instance's ssh port.
const REMOTE_SSH_PORT: &str = "22";

/// Tunnel argument vector, excluding the program name. The instance is
/// positional and precedes all flags; the zone flag is appended only when a
/// zone was configured.
pub fn argv(config: &Config) -> Result<Vec<String>, LaunchError> {
    let mut args = vec![
        "compute".to_string(),
        "start-iap-tunnel".to_string(),
        config.instance.clone(),
        REMOTE_SSH_PORT.to_string(),
    ];
    args.push(bounded_arg(
        "local bind",
        format!("--local-host-port=localhost:{}", config.local_port),
    )?);
    if let Some(zone) = &config.zone {
        args.push(bounded_arg("zone", format!("--zone={zone}"))?);
    }
    Ok(args)
}

/// Child-side entry: detaches stdin/stdout from the terminal and replaces
/// this process with the tunnel command. Never returns; any failure exits
/// the child with a failure status before the external command runs.
pub fn exec(config: &Config) -> ! {
    let err = match argv(config) {
        Ok(args) => match detach_terminal() {
            Ok(()) => exec_program(TUNNEL_PROGRAM, &args),
            Err(err) => err,
        },
        Err(err) => err,
    };
    error!("tunnel launch failed: {err}");
    process::exit(1);
}

/// Points stdin and stdout at /dev/null. Stderr stays attached so tunnel
/// diagnostics remain visible on the operator's terminal.
fn detach_terminal() -> Result<(), LaunchError> {
    let null =
        fcntl::open("/dev/null", OFlag::O_RDWR, Mode::empty()).map_err(LaunchError::Detach)?;
    unistd::dup2(null, libc::STDIN_FILENO).map_err(LaunchError::Detach)?;
    unistd::dup2(null, libc::STDOUT_FILENO).map_err(LaunchError::Detach)?;
    unistd::close(null).map_err(LaunchError::Detach)?;
    Ok(())
}
