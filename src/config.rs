//! Ports, timeouts and default header used by a [crate::Projector]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::proto::{Header, PROTOCOL_VERSION};

/// Port projectors broadcast SDAP announcements to
pub const DEFAULT_DISCOVERY_PORT: u16 = 53862;

/// Port projectors accept SDCP commands on
pub const DEFAULT_COMMAND_PORT: u16 = 53484;

/// Projectors announce every 30 seconds, wait for at least one
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(31);

/// Timeout of a single command exchange
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Category of projectors
pub const DEFAULT_CATEGORY: u8 = 10;

/// Factory community name
pub const DEFAULT_COMMUNITY: &str = "SONY";

/// Network settings of a projector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Local address to listen for announcements on
    pub discovery_ip: IpAddr,
    /// Local port to listen for announcements on
    pub discovery_port: u16,
    /// How long discovery waits for an announcement
    pub discovery_timeout: Duration,
    /// Projector port to send commands to
    pub command_port: u16,
    /// How long a command exchange may take
    pub command_timeout: Duration,
    /// Header used when the projector address is known without discovery
    pub default_header: Header,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            discovery_port: DEFAULT_DISCOVERY_PORT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            command_port: DEFAULT_COMMAND_PORT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            default_header: Header::new(PROTOCOL_VERSION, DEFAULT_CATEGORY, DEFAULT_COMMUNITY),
        }
    }
}

impl Config {
    /// Listen for announcements on another local address and port
    pub fn with_discovery_addr(mut self, ip: IpAddr, port: u16) -> Self {
        self.discovery_ip = ip;
        self.discovery_port = port;
        self
    }

    /// Wait a different amount of time for announcements
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Send commands to another port
    pub fn with_command_port(mut self, port: u16) -> Self {
        self.command_port = port;
        self
    }

    /// Bound command exchanges by another timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Use another community name for projectors with a known address
    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.default_header.community = community.into();
        self
    }
}
