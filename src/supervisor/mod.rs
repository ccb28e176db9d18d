//! Dual-subprocess lifecycle supervisor.
//!
//! Forks the tunnel child, gates the shell start on tunnel readiness, forks
//! the shell child, then blocks on child terminations and enforces the
//! coupled-lifetime rule: neither child may outlive the other. The
//! supervisor itself only returns once the kernel reports that no children
//! remain.

mod child;
mod readiness;

pub use child::Role;
pub use readiness::Settle;

use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::launch;
use child::ChildHandle;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("failed to fork {role} process: {source}")]
    Fork {
        role: Role,
        source: nix::Error,
    },

    #[error("tunnel process exited before its local port came up")]
    TunnelDied,

    #[error("tunnel did not accept connections on port {port} within {timeout:?}")]
    TunnelNotReady { port: u16, timeout: Duration },

    #[error("failed waiting for children: {0}")]
    Wait(#[source] nix::Error),
}

pub struct Supervisor {
    config: Config,
    settle: Settle,
    tunnel: Option<ChildHandle>,
    shell: Option<ChildHandle>,
}

impl Supervisor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            settle: Settle::default(),
            tunnel: None,
            shell: None,
        }
    }

    /// Overrides the readiness poll pacing.
    pub fn with_settle(mut self, settle: Settle) -> Self {
        self.settle = settle;
        self
    }

    /// Runs the whole lifecycle: tunnel up, shell up, then block until both
    /// children are gone. Returns successfully once no children remain.
    pub fn run(mut self) -> Result<(), SupervisorError> {
        let tunnel = self.fork_child(Role::Tunnel)?;
        self.tunnel = Some(ChildHandle::new(tunnel, Role::Tunnel));
        info!("tunnel process started (pid {tunnel})");

        self.await_tunnel_ready(tunnel)?;

        let shell = match self.fork_child(Role::Shell) {
            Ok(pid) => pid,
            Err(err) => {
                // the tunnel must not outlive a failed shell start
                self.abort_tunnel();
                return Err(err);
            }
        };
        self.shell = Some(ChildHandle::new(shell, Role::Shell));
        info!("shell process started (pid {shell})");

        self.supervise()
    }

    /// Forks one child. The child half never returns from here: it execs
    /// the external command for `role`, or exits with a failure status.
    fn fork_child(&self, role: Role) -> Result<Pid, SupervisorError> {
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { child }) => Ok(child),
            Ok(ForkResult::Child) => match role {
                Role::Tunnel => launch::tunnel::exec(&self.config),
                Role::Shell => launch::shell::exec(&self.config),
            },
            Err(source) => Err(SupervisorError::Fork { role, source }),
        }
    }

    /// Readiness barrier: polls the bind target until it accepts a
    /// connection, checking along the way that the tunnel child is still
    /// alive. Fails closed: on timeout or early tunnel death no child is
    /// left running when this returns an error.
    fn await_tunnel_ready(&mut self, pid: Pid) -> Result<(), SupervisorError> {
        let deadline = Instant::now() + self.settle.timeout;
        let mut interval = self.settle.initial_interval;

        loop {
            match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => {}
                Ok(status) => {
                    warn!("tunnel process {pid} {}", describe_exit(&status));
                    if let Some(tunnel) = self.tunnel.as_mut() {
                        tunnel.invalidate();
                    }
                    return Err(SupervisorError::TunnelDied);
                }
                Err(err) => {
                    self.abort_tunnel();
                    return Err(SupervisorError::Wait(err));
                }
            }

            if readiness::listener_up(self.config.local_port) {
                debug!(
                    "tunnel is accepting connections on port {}",
                    self.config.local_port
                );
                return Ok(());
            }

            if Instant::now() >= deadline {
                self.abort_tunnel();
                return Err(SupervisorError::TunnelNotReady {
                    port: self.config.local_port,
                    timeout: self.settle.timeout,
                });
            }

            thread::sleep(interval);
            interval = readiness::next_interval(&self.settle, interval);
        }
    }

    /// Terminates and reaps the tunnel child if it is still live. Used on
    /// every failure path after the first fork so no tunnel is orphaned.
    fn abort_tunnel(&mut self) {
        let Some(tunnel) = self.tunnel.as_mut() else {
            return;
        };
        if !tunnel.is_live() {
            return;
        }
        let pid = tunnel.pid();
        if let Err(err) = signal::kill(pid, Signal::SIGTERM) {
            debug!("tunnel {pid} already gone: {err}");
        }
        if let Err(err) = wait::waitpid(pid, None) {
            debug!("could not reap tunnel {pid}: {err}");
        }
        tunnel.invalidate();
    }

    /// Blocks on child terminations, applying the coupled-termination rule,
    /// until the kernel reports that no children remain.
    fn supervise(&mut self) -> Result<(), SupervisorError> {
        loop {
            match wait::wait() {
                Err(nix::Error::ECHILD) => {
                    debug!("no children remain");
                    return Ok(());
                }
                Err(err) => return Err(SupervisorError::Wait(err)),
                Ok(status) => {
                    let Some(pid) = status.pid() else { continue };
                    let Some((role, sibling)) = self.coupled_reaction(pid) else {
                        continue;
                    };
                    info!("{role} process {pid} {}", describe_exit(&status));
                    if let Some(victim) = sibling {
                        debug!("terminating {victim} along with its sibling");
                        if let Err(err) = signal::kill(victim, Signal::SIGTERM) {
                            debug!("sibling {victim} already gone: {err}");
                        }
                    }
                }
            }
        }
    }

    /// Marks the exited child's handle dead and names the sibling that now
    /// has to be signalled, if any. Idempotent: a pid whose handle was
    /// already invalidated produces no reaction, so a child is never
    /// signalled twice.
    fn coupled_reaction(&mut self, exited: Pid) -> Option<(Role, Option<Pid>)> {
        if let Some(tunnel) = self.tunnel.as_mut() {
            if tunnel.matches(exited) {
                tunnel.invalidate();
                let role = tunnel.role();
                let sibling = self
                    .shell
                    .as_ref()
                    .filter(|shell| shell.is_live())
                    .map(|shell| shell.pid());
                return Some((role, sibling));
            }
        }
        if let Some(shell) = self.shell.as_mut() {
            if shell.matches(exited) {
                shell.invalidate();
                let role = shell.role();
                let sibling = self
                    .tunnel
                    .as_ref()
                    .filter(|tunnel| tunnel.is_live())
                    .map(|tunnel| tunnel.pid());
                return Some((role, sibling));
            }
        }
        None
    }
}

fn describe_exit(status: &WaitStatus) -> String {
    match status {
        WaitStatus::Exited(_, code) => format!("exited with status {code}"),
        WaitStatus::Signaled(_, sig, _) => format!("was terminated by {sig}"),
        other => format!("reported {other:?}"),
    }
}
