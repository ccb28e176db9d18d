//! gcp-shell opens an IAP tunnel to a GCP compute instance and an
//! interactive ssh session through it, closing whichever of the two
//! outlives the other.
//!
//! - **Config**: validated invocation record (zone, local port, instance,
//!   login name)
//! - **Launchers**: argument construction and child-side exec of the
//!   external `gcloud` and `ssh` commands
//! - **Supervisor**: forks both children, gates the shell start on tunnel
//!   readiness, and enforces the coupled-lifetime rule

pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod supervisor;

// Re-export commonly used types
pub use config::Config;
pub use error::{GcpShellError, Result};
pub use supervisor::{Role, Settle, Supervisor};
