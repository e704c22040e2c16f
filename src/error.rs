use packed_struct::PackingError;
use std::fmt::Display;

/// When things go awry. Errors at the wire-decode and request-handling
/// boundary are narrowed to an RCODE before they escape a single request
/// (§7); this enum exists for everything else: zone loading, socket
/// binding and configuration.
#[derive(Debug)]
pub enum ServerError {
    /// A malformed message that can't be parsed at all (too short, label
    /// type reserved bits set, pointer loop, etc). Carries the reason so
    /// it can be logged.
    FormatError(&'static str),
    BytePackingError(String),
    IoError(std::io::Error),
    /// Something failed while loading the zone directory.
    ZoneLoadError(String),
    /// Failed to bind or otherwise start a listener.
    StartupError(String),
    /// Encode exceeded a caller-imposed size limit (§4.1) — the only way
    /// encoding is allowed to fail.
    Buffer,
    Generic(String),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::FormatError(msg) => write!(f, "format error: {msg}"),
            ServerError::BytePackingError(msg) => write!(f, "byte packing error: {msg}"),
            ServerError::IoError(err) => write!(f, "io error: {err}"),
            ServerError::ZoneLoadError(msg) => write!(f, "zone load error: {msg}"),
            ServerError::StartupError(msg) => write!(f, "startup error: {msg}"),
            ServerError::Buffer => write!(f, "BUFFER: encoded message exceeds size limit"),
            ServerError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(error: std::io::Error) -> Self {
        ServerError::IoError(error)
    }
}

impl From<PackingError> for ServerError {
    fn from(error: PackingError) -> Self {
        ServerError::BytePackingError(error.to_string())
    }
}

impl From<json5::Error> for ServerError {
    fn from(error: json5::Error) -> Self {
        ServerError::ZoneLoadError(error.to_string())
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::StartupError(error.to_string())
    }
}
