#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::io;

use thiserror::Error;

pub mod proto;
pub mod client;
pub mod commands;
pub mod config;

pub use client::{Connector, Projector, TcpConnector};
pub use commands::{CommandSet, PowerState};
pub use config::Config;

/// General error that can occur while discovering or commanding a projector
#[derive(Debug, Error)]
pub enum Error {
    /// IO Error
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    /// Unknown setting, value not permitted for a setting, or malformed header
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Failed to parse a response or announcement
    #[error("Invalid packet: {0}")]
    InvalidPacket(proto::Error),
    /// Connecting, sending or receiving took longer than the command timeout
    #[error("Timeout while sending command {command:#06x}")]
    Timeout {
        /// Command being sent
        command: u16,
    },
    /// Connection accepted fewer bytes than the request holds
    #[error("Failed sending entire request: sent {sent} out of {expected}")]
    ShortWrite {
        /// Bytes sent
        sent: usize,
        /// Request size
        expected: usize,
    },
    /// No address was given and no projector announced itself
    #[error("No projector found and / or specified")]
    NotFound,
    /// Stream was closed before any response byte arrived
    #[error("Stream ended before sending a response")]
    UnexpectedEndOfStream,
    /// Projector answered with its failure flag set
    #[error("Projector rejected command {command:#06x} with error {data:?}")]
    Device {
        /// Echoed command
        command: u16,
        /// Error code returned by the projector
        data: Option<u16>,
    },
    /// Projector answered with another command than the one sent
    #[error("Unexpected response to command {:#06x}", .0.command)]
    UnexpectedResponse(proto::Response),
    /// Projector answered a query without data
    #[error("Projector answered command {command:#06x} without data")]
    MissingData {
        /// Command being queried
        command: u16,
    },
}

impl From<proto::Error> for Error {
    fn from(error: proto::Error) -> Self {
        match error {
            proto::Error::InvalidCommunity(_) => Error::InvalidArgument(error.to_string()),
            other => Error::InvalidPacket(other),
        }
    }
}
