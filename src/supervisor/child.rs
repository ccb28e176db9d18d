use std::fmt;

use nix::unistd::Pid;

/// Which of the two cooperating children a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Tunnel,
    Shell,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Tunnel => f.write_str("tunnel"),
            Role::Shell => f.write_str("shell"),
        }
    }
}

/// Supervisor-owned handle to a forked child.
///
/// Invalidated exactly once, when the process is known to have exited; an
/// invalidated handle is never matched or signalled again.
#[derive(Debug)]
pub(crate) struct ChildHandle {
    pid: Pid,
    role: Role,
    live: bool,
}

impl ChildHandle {
    pub fn new(pid: Pid, role: Role) -> Self {
        Self {
            pid,
            role,
            live: true,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// True when `pid` is this child and it has not already been reaped.
    pub fn matches(&self, pid: Pid) -> bool {
        self.live && self.pid == pid
    }

    pub fn invalidate(&mut self) {
        self.live = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_matches_only_while_live() {
        let pid = Pid::from_raw(4242);
        let mut handle = ChildHandle::new(pid, Role::Tunnel);

        assert!(handle.is_live());
        assert!(handle.matches(pid));
        assert!(!handle.matches(Pid::from_raw(4243)));

        handle.invalidate();
        assert!(!handle.is_live());
        assert!(!handle.matches(pid));

        // invalidation is idempotent
        handle.invalidate();
        assert!(!handle.matches(pid));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Tunnel.to_string(), "tunnel");
        assert_eq!(Role::Shell.to_string(), "shell");
        assert_eq!(ChildHandle::new(Pid::from_raw(1), Role::Shell).role(), Role::Shell);
    }
}
