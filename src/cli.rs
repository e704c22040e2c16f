//! Command-line flags (§6, SPEC_FULL.md §1). Grounded on the teacher's
//! `cli.rs` use of `clap::Parser`, trimmed to a single flat struct — this
//! engine has no subcommands, only the one `Server` mode the teacher's
//! `Commands::Server` variant models.

use clap::Parser;
use std::net::IpAddr;

#[derive(Parser, Debug)]
#[command(arg_required_else_help(false))]
/// An authoritative DNS name server for locally administered zones.
pub struct Cli {
    /// Zone-file directory (§6's zone-load boundary).
    #[clap(long)]
    pub dir: Option<String>,

    /// The server's own address, used for the listener and NOTIFY
    /// self-filtering (§4.6, §6).
    #[clap(long)]
    pub address: Option<IpAddr>,

    /// UDP/TCP listener port. Defaults to the configuration file's value.
    #[clap(long)]
    pub port: Option<u16>,

    /// Configuration file path.
    #[clap(short, long)]
    pub config: Option<String>,

    #[clap(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Applies any flags the user actually passed on top of a loaded
    /// [`crate::config::ConfigFile`], CLI taking precedence (§6).
    pub fn apply_overrides(&self, mut config: crate::config::ConfigFile) -> crate::config::ConfigFile {
        if let Some(dir) = &self.dir {
            config.zone_dir = dir.into();
        }
        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.debug {
            config.log_level = "debug".to_string();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    #[test]
    fn cli_flags_override_loaded_config() {
        let cli = Cli {
            dir: Some("/zones".to_string()),
            address: Some(IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 1))),
            port: Some(53),
            config: None,
            debug: true,
        };
        let config = cli.apply_overrides(ConfigFile::default());
        assert_eq!(config.zone_dir, std::path::PathBuf::from("/zones"));
        assert_eq!(config.port, 53);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let cli = Cli {
            dir: None,
            address: None,
            port: None,
            config: None,
            debug: false,
        };
        let config = cli.apply_overrides(ConfigFile::default());
        assert_eq!(config, ConfigFile::default());
    }
}
