use clap::Parser;

/// Open an IAP tunnel to a GCP compute instance and ssh through it.
///
/// The tunnel is opened on the local port, ssh connects through it, and
/// whichever of the two finishes first takes the other down with it.
#[derive(Parser, Debug)]
#[command(name = "gcp-shell", version, about)]
pub struct Cli {
    /// GCP zone of the instance (defaults to the usual gcloud configuration)
    #[arg(short = 'z', long)]
    pub zone: Option<String>,

    /// Local port the IAP tunnel listens on
    #[arg(
        short = 'p',
        long,
        default_value_t = 2022,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub local_port: u16,

    /// Instance to connect to, optionally with a login name
    #[arg(value_name = "[user@]instance")]
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags_and_target() {
        let cli =
            Cli::try_parse_from(["gcp-shell", "-z", "us-east1-b", "-p", "2022", "alice@db1"])
                .unwrap();
        assert_eq!(cli.zone.as_deref(), Some("us-east1-b"));
        assert_eq!(cli.local_port, 2022);
        assert_eq!(cli.target, "alice@db1");
    }

    #[test]
    fn test_long_flags() {
        let cli =
            Cli::try_parse_from(["gcp-shell", "--zone", "europe-west1-c", "--local-port", "8080", "web1"])
                .unwrap();
        assert_eq!(cli.zone.as_deref(), Some("europe-west1-c"));
        assert_eq!(cli.local_port, 8080);
        assert_eq!(cli.target, "web1");
    }

    #[test]
    fn test_port_defaults_to_2022() {
        let cli = Cli::try_parse_from(["gcp-shell", "web1"]).unwrap();
        assert_eq!(cli.local_port, 2022);
        assert_eq!(cli.zone, None);
    }

    #[test]
    fn test_target_is_required() {
        assert!(Cli::try_parse_from(["gcp-shell"]).is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        assert!(Cli::try_parse_from(["gcp-shell", "-p", "0", "web1"]).is_err());
    }

    #[test]
    fn test_non_numeric_port_rejected() {
        assert!(Cli::try_parse_from(["gcp-shell", "-p", "twenty", "web1"]).is_err());
    }
}
