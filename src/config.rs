//! Engine configuration (§6, SPEC_FULL.md §1). Grounded on the teacher's
//! `config.rs`: a `serde`-derived `ConfigFile` loaded by the `config`
//! crate from a JSON file plus environment overrides, trimmed to the
//! fields this engine actually consumes.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    /// The server's own address, used both for the listener and to filter
    /// self-notification out of the NOTIFY emitter (§4.6, §6).
    pub address: IpAddr,
    /// Port shared by the UDP and TCP listeners.
    pub port: u16,
    /// Directory of JSON5 zone files loaded at startup (§6's zone-load
    /// boundary).
    pub zone_dir: PathBuf,
    /// Default is "info", matching `tracing_subscriber::EnvFilter`'s
    /// directive syntax.
    pub log_level: String,
    /// Whether an UPDATE naming a zone this server doesn't yet have may
    /// create it (§4.4).
    pub allow_zone_create: bool,
    /// Whether an UPDATE deleting a zone's SOA may remove the zone
    /// entirely (§4.4).
    pub allow_zone_delete: bool,
    /// Whether a committed UPDATE triggers NOTIFY to the zone's apex NS
    /// set (§4.6).
    pub notify_enabled: bool,
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile {
            address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5353,
            zone_dir: PathBuf::from("./zones"),
            log_level: "info".to_string(),
            allow_zone_create: true,
            allow_zone_delete: true,
            notify_enabled: true,
        }
    }
}

/// Default on-disk locations checked when no `--config` path is given,
/// in order.
const CONFIG_LOCATIONS: &[&str] = &["./zoneward.json", "/etc/zoneward/zoneward.json"];

impl ConfigFile {
    /// A bindable address for the UDP/TCP listeners.
    pub fn listen_address(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Loads configuration from `config_path` if given, else the first of
    /// [`CONFIG_LOCATIONS`] that exists, layered with `ZONEWARD_`-prefixed
    /// environment variables, falling back to [`ConfigFile::default`] if
    /// nothing is found on disk at all.
    pub fn load(config_path: Option<&str>) -> Result<ConfigFile, std::io::Error> {
        let candidates: Vec<String> = match config_path {
            Some(value) => vec![value.to_string()],
            None => CONFIG_LOCATIONS.iter().map(|s| s.to_string()).collect(),
        };

        for path in &candidates {
            if !std::path::Path::new(path).exists() {
                continue;
            }
            let builder = config::Config::builder()
                .add_source(config::File::new(path, config::FileFormat::Json))
                .add_source(config::Environment::with_prefix("zoneward"));

            match builder.build() {
                Ok(built) => match built.try_deserialize::<ConfigFile>() {
                    Ok(file) => {
                        eprintln!("Loaded configuration from {path}");
                        return Ok(file);
                    }
                    Err(e) => eprintln!("Failed to parse config at {path}: {e}"),
                },
                Err(e) => eprintln!("Failed to load config at {path}: {e}"),
            }
        }

        if config_path.is_some() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {candidates:?}"),
            ));
        }

        eprintln!("No configuration file found, using defaults");
        Ok(ConfigFile::default())
    }
}
