//! Launch plumbing shared by the tunnel and shell children: PATH lookup,
//! bounded argument formatting, and the exec call itself.

use std::env;
use std::ffi::CString;
use std::path::{Path, PathBuf};

use nix::unistd;
use thiserror::Error;

pub mod shell;
pub mod tunnel;

/// Longest accepted formatted argument. Anything bigger fails construction
/// before the external command is invoked, rather than running it with
/// truncated arguments.
pub const MAX_ARG_LEN: usize = 200;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{what} argument is too long ({len} bytes, limit {MAX_ARG_LEN})")]
    ArgumentTooLong { what: &'static str, len: usize },

    #[error("argument contains an interior NUL byte: {0}")]
    BadArgument(#[from] std::ffi::NulError),

    #[error("'{0}' not found on PATH")]
    ProgramNotFound(&'static str),

    #[error("failed to exec '{program}': {source}")]
    Exec {
        program: &'static str,
        source: nix::Error,
    },

    #[error("failed to detach terminal: {0}")]
    Detach(#[source] nix::Error),
}

/// Checks that both external programs exist before anything is forked, so a
/// missing binary surfaces as an ordinary startup error instead of a dead
/// child.
pub fn preflight() -> Result<(), LaunchError> {
    for program in [tunnel::TUNNEL_PROGRAM, shell::SHELL_PROGRAM] {
        if resolve_program(program).is_none() {
            return Err(LaunchError::ProgramNotFound(program));
        }
    }
    Ok(())
}

/// Looks `name` up on PATH, requiring a regular file with the executable
/// bit set.
pub fn resolve_program(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Rejects a formatted argument that would overflow the launcher's bound.
fn bounded_arg(what: &'static str, arg: String) -> Result<String, LaunchError> {
    if arg.len() >= MAX_ARG_LEN {
        return Err(LaunchError::ArgumentTooLong { what, len: arg.len() });
    }
    Ok(arg)
}

/// Replaces the current process image with `program`, passed as argv[0]
/// followed by `args`. Returns only on failure.
fn exec_program(program: &'static str, args: &[String]) -> LaunchError {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(program.to_string());
    argv.extend(args.iter().cloned());

    let cargs: Vec<CString> = match argv.into_iter().map(CString::new).collect() {
        Ok(cargs) => cargs,
        Err(err) => return LaunchError::BadArgument(err),
    };

    match unistd::execvp(&cargs[0], &cargs) {
        Err(err) => LaunchError::Exec {
            program,
            source: err,
        },
        Ok(_) => unreachable!("execvp returned Ok"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_arg_passes_short_values() {
        let arg = bounded_arg("zone", "--zone=us-east1-b".to_string()).unwrap();
        assert_eq!(arg, "--zone=us-east1-b");
    }

    #[test]
    fn test_bounded_arg_rejects_overflow() {
        let oversized = "z".repeat(MAX_ARG_LEN);
        let err = bounded_arg("zone", oversized).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::ArgumentTooLong { what: "zone", len } if len == MAX_ARG_LEN
        ));
    }

    #[test]
    fn test_resolve_program_finds_sh() {
        let path = resolve_program("sh").expect("sh should be on PATH");
        assert!(path.ends_with("sh"));
    }

    #[test]
    fn test_resolve_program_misses_nonsense() {
        assert!(resolve_program("gcp-shell-no-such-program").is_none());
    }
}
