use thiserror::Error;

/// Longest accepted login name; anything bigger is rejected at resolution
/// time, before any child process exists.
pub const MAX_USERNAME_LEN: usize = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("instance name is empty")]
    EmptyInstance,

    #[error("username is too long ({0} bytes, limit {MAX_USERNAME_LEN})")]
    UsernameTooLong(usize),

    #[error("local port must be positive")]
    InvalidPort,
}

/// Resolved invocation record, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// GCP zone; `None` falls back to the ambient gcloud configuration.
    pub zone: Option<String>,
    /// Local port the tunnel binds and ssh connects through.
    pub local_port: u16,
    /// Compute instance to tunnel to.
    pub instance: String,
    /// Login name for the ssh hop; `None` uses the ambient identity.
    pub username: Option<String>,
}

impl Config {
    /// Validates raw command-line input into a `Config`. `target` is the
    /// `[user@]instance` positional argument.
    pub fn resolve(
        zone: Option<String>,
        local_port: u16,
        target: &str,
    ) -> Result<Self, ConfigError> {
        if local_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        let (username, instance) = split_target(target)?;
        Ok(Self {
            zone: zone.filter(|zone| !zone.is_empty()),
            local_port,
            instance,
            username,
        })
    }
}

/// Splits `[user@]instance` at the first `@`. An empty user part means
/// "ambient login identity"; an empty instance part is an error.
fn split_target(target: &str) -> Result<(Option<String>, String), ConfigError> {
    let (user, instance) = match target.split_once('@') {
        Some((user, instance)) => (Some(user), instance),
        None => (None, target),
    };
    if instance.is_empty() {
        return Err(ConfigError::EmptyInstance);
    }
    let username = match user {
        None | Some("") => None,
        Some(user) if user.len() > MAX_USERNAME_LEN => {
            return Err(ConfigError::UsernameTooLong(user.len()));
        }
        Some(user) => Some(user.to_string()),
    };
    Ok((username, instance.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_instance() {
        let config = Config::resolve(None, 2022, "db1").unwrap();
        assert_eq!(config.instance, "db1");
        assert_eq!(config.username, None);
        assert_eq!(config.local_port, 2022);
    }

    #[test]
    fn test_user_at_instance() {
        let config = Config::resolve(None, 2022, "alice@db1").unwrap();
        assert_eq!(config.instance, "db1");
        assert_eq!(config.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_empty_user_means_ambient_identity() {
        let config = Config::resolve(None, 2022, "@db1").unwrap();
        assert_eq!(config.instance, "db1");
        assert_eq!(config.username, None);
    }

    #[test]
    fn test_split_happens_at_first_at_sign() {
        let config = Config::resolve(None, 2022, "alice@db1@weird").unwrap();
        assert_eq!(config.username.as_deref(), Some("alice"));
        assert_eq!(config.instance, "db1@weird");
    }

    #[test]
    fn test_empty_instance_rejected() {
        assert_eq!(
            Config::resolve(None, 2022, ""),
            Err(ConfigError::EmptyInstance)
        );
        assert_eq!(
            Config::resolve(None, 2022, "alice@"),
            Err(ConfigError::EmptyInstance)
        );
    }

    #[test]
    fn test_oversized_username_rejected() {
        let target = format!("{}@db1", "u".repeat(MAX_USERNAME_LEN + 1));
        assert_eq!(
            Config::resolve(None, 2022, &target),
            Err(ConfigError::UsernameTooLong(MAX_USERNAME_LEN + 1))
        );
    }

    #[test]
    fn test_username_at_limit_accepted() {
        let user = "u".repeat(MAX_USERNAME_LEN);
        let config = Config::resolve(None, 2022, &format!("{user}@db1")).unwrap();
        assert_eq!(config.username, Some(user));
    }

    #[test]
    fn test_empty_zone_normalizes_to_none() {
        let config = Config::resolve(Some(String::new()), 2022, "db1").unwrap();
        assert_eq!(config.zone, None);
    }

    #[test]
    fn test_zero_port_rejected() {
        assert_eq!(Config::resolve(None, 0, "db1"), Err(ConfigError::InvalidPort));
    }
}
