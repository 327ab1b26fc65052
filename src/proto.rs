//! Structures and methods to create and parse SDCP frames and SDAP announcements
//!
//! Request frame layout (10 bytes, or 12 with data):
//!
//! ```text
//! +---------+----------+-----------+--------+---------+----------+--------+
//! | version | category | community | action | command | data_len | data   |
//! | 1 byte  | 1 byte   | 4 bytes   | 1 byte | 2 bytes | 1 byte   | 0 or 2 |
//! +---------+----------+-----------+--------+---------+----------+--------+
//! ```
//!
//! Responses share the layout, with the action byte replaced by a success flag.

use std::net::SocketAddr;

use thiserror::Error;

/// The only protocol version projectors accept in command frames
pub const PROTOCOL_VERSION: u8 = 2;

/// Width of the community field
pub const COMMUNITY_LEN: usize = 4;

/// Size of a frame without data
pub const FRAME_HEADER_SIZE: usize = 10;

/// Data is always carried as a big-endian u16
pub const DATA_SIZE: u8 = 2;

/// Size of the fixed prefix of an SDAP announcement (everything but the location)
pub const ANNOUNCEMENT_MIN_SIZE: usize = 26;

/// Version, category and community carried at the start of every frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Protocol version
    pub version: u8,
    /// Device category (10 for projectors)
    pub category: u8,
    /// Community name, 4 ASCII characters on the wire
    pub community: String,
}

impl Header {
    /// Create a new header
    pub fn new(version: u8, category: u8, community: impl Into<String>) -> Self {
        Self { version, category, community: community.into() }
    }

    fn write_into(&self, bytes: &mut Vec<u8>) -> Result<(), Error> {
        let community = self.community.as_bytes();
        if community.len() != COMMUNITY_LEN || !self.community.is_ascii() {
            return Err(Error::InvalidCommunity(self.community.clone()));
        }
        bytes.push(self.version);
        bytes.push(self.category);
        bytes.extend_from_slice(community);
        Ok(())
    }

    fn from_bytes(input: &[u8]) -> Result<Self, Error> {
        let bytes = take(input, 0, 2 + COMMUNITY_LEN)?;
        Ok(Self {
            version: bytes[0],
            category: bytes[1],
            community: decode_text_field(&bytes[2..])?,
        })
    }
}

/// Identity and status announced by a projector over SDAP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Two character packet id ("DA")
    pub id: String,
    /// Product name, e.g. "VPL-VW320"
    pub product_name: String,
    /// Serial number
    pub serial_number: u32,
    /// Power state code at announcement time (see [crate::commands::PowerState])
    pub power_state: u16,
    /// Installation location set on the projector
    pub location: String,
}

/// A decoded SDAP announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Address the announcement came from
    pub source: SocketAddr,
    /// Header as announced (its version is informational only)
    pub header: Header,
    /// Projector identity
    pub info: DeviceInfo,
}

/// A command response sent back by a projector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Echoed header
    pub header: Header,
    /// Whether the projector accepted the command
    pub success: bool,
    /// Echoed command code
    pub command: u16,
    /// Returned value, or error code when `success` is false
    pub data: Option<u16>,
}

impl Response {
    /// Parse a response from the start of `input`.
    ///
    /// Returns the response and the number of bytes it spans.
    pub fn from_bytes(input: &[u8]) -> Result<(Self, usize), Error> {
        let header = Header::from_bytes(input)?;
        let fixed = take(input, 0, FRAME_HEADER_SIZE)?;
        let success = fixed[6] != 0;
        let command = u16::from_be_bytes([fixed[7], fixed[8]]);
        let data_len = fixed[9];

        let data = match data_len {
            0 => None,
            1 => return Err(Error::InvalidDataLength(data_len)),
            _ => {
                let data = take(input, FRAME_HEADER_SIZE, data_len as usize)?;
                Some(u16::from_be_bytes([data[0], data[1]]))
            }
        };

        Ok((Self { header, success, command, data }, FRAME_HEADER_SIZE + data_len as usize))
    }
}

/// Encode a command request.
///
/// The header version is written as given; callers building frames for a real
/// projector should use [PROTOCOL_VERSION].
pub fn encode_request(header: &Header, action: u8, command: u16, data: Option<u16>) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::with_capacity(FRAME_HEADER_SIZE + DATA_SIZE as usize);
    header.write_into(&mut bytes)?;
    bytes.push(action);
    bytes.extend_from_slice(&command.to_be_bytes());
    match data {
        Some(data) => {
            bytes.push(DATA_SIZE);
            bytes.extend_from_slice(&data.to_be_bytes());
        }
        None => bytes.push(0),
    }
    Ok(bytes)
}

/// Decode a complete command response
pub fn decode_response(input: &[u8]) -> Result<Response, Error> {
    Response::from_bytes(input).map(|(response, _)| response)
}

/// Decode an SDAP announcement received from `source`
pub fn decode_discovery(input: &[u8], source: SocketAddr) -> Result<Announcement, Error> {
    let fixed = take(input, 0, ANNOUNCEMENT_MIN_SIZE)?;

    let id = std::str::from_utf8(&fixed[0..2])
        .map_err(|_| Error::InvalidText)?
        .to_owned();
    let header = Header::from_bytes(&fixed[2..8])?;

    let info = DeviceInfo {
        id,
        product_name: decode_text_field(&fixed[8..20])?,
        serial_number: u32::from_be_bytes([fixed[20], fixed[21], fixed[22], fixed[23]]),
        power_state: u16::from_be_bytes([fixed[24], fixed[25]]),
        location: decode_text_field(&input[ANNOUNCEMENT_MIN_SIZE..])?,
    };

    Ok(Announcement { source, header, info })
}

/// Convert a fixed width, NUL padded char field into a string.
///
/// Only trailing NUL bytes are removed.
pub fn decode_text_field(input: &[u8]) -> Result<String, Error> {
    let text = std::str::from_utf8(input).map_err(|_| Error::InvalidText)?;
    Ok(text.trim_end_matches('\0').to_owned())
}

fn take(input: &[u8], offset: usize, len: usize) -> Result<&[u8], Error> {
    input.get(offset..offset + len).ok_or(Error::IncompleteInput {
        needed: offset + len,
        got: input.len(),
    })
}

/// Error that can occur while encoding or parsing frames
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Input is shorter than the layout it declares
    #[error("Incomplete input: needed {needed} bytes, got {got}")]
    IncompleteInput {
        /// Bytes required by the layout
        needed: usize,
        /// Bytes available
        got: usize,
    },
    /// Community must be exactly 4 ASCII characters
    #[error("Invalid community {0:?}: expected 4 ASCII characters")]
    InvalidCommunity(String),
    /// Response declared a data length that cannot hold a u16
    #[error("Invalid data length: {0}")]
    InvalidDataLength(u8),
    /// A text field is not valid UTF-8
    #[error("Text field is not valid UTF-8")]
    InvalidText,
}

#[cfg(test)]
mod test {
    use std::net::SocketAddr;

    use super::*;

    fn sony() -> Header {
        Header::new(PROTOCOL_VERSION, 10, "SONY")
    }

    fn source() -> SocketAddr {
        "10.0.0.139:53862".parse().unwrap()
    }

    fn announcement(location: &[u8]) -> Vec<u8> {
        let mut bytes = b"DA".to_vec();
        bytes.extend_from_slice(&[2, 10]);
        bytes.extend_from_slice(b"SONY");
        bytes.extend_from_slice(b"VPL-VW320\0\0\0");
        bytes.extend_from_slice(&0x0012_D687_u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x03]);
        bytes.extend_from_slice(location);
        bytes
    }

    #[test]
    fn should_encode_set_power_on() {
        assert_eq!(
            encode_request(&sony(), 0x00, 0x0130, Some(1)).unwrap(),
            vec![0x02, 0x0A, 0x53, 0x4F, 0x4E, 0x59, 0x00, 0x01, 0x30, 0x02, 0x00, 0x01]
        );
    }

    #[test]
    fn should_encode_get_without_data() {
        let bytes = encode_request(&sony(), 0x01, 0x0102, None).unwrap();
        assert_eq!(bytes, vec![0x02, 0x0A, b'S', b'O', b'N', b'Y', 0x01, 0x01, 0x02, 0x00]);
        assert_eq!(bytes.len(), FRAME_HEADER_SIZE);
    }

    #[test]
    fn should_reject_bad_community() {
        let header = Header::new(PROTOCOL_VERSION, 10, "SON");
        assert_eq!(
            encode_request(&header, 0x00, 0x0130, None),
            Err(Error::InvalidCommunity("SON".into()))
        );
        let header = Header::new(PROTOCOL_VERSION, 10, "SÖNY");
        assert!(matches!(encode_request(&header, 0x00, 0x0130, None), Err(Error::InvalidCommunity(_))));
    }

    #[test]
    fn should_answer_a_request_like_a_peer() {
        let headers = [sony(), Header::new(1, 0xFF, "ABCD"), Header::new(0, 0, "    ")];
        let actions = [0x00, 0x01];
        let commands = [0x0000, 0x0020, 0x0102, 0x0130, 0xFFFF];
        let data = [None, Some(0x0000), Some(0x000E), Some(0xFFFF)];

        for header in &headers {
            for action in actions {
                for command in commands {
                    for data in data {
                        let request = encode_request(header, action, command, data).unwrap();
                        assert_eq!(request.len(), if data.is_some() { 12 } else { 10 });

                        // The action sits where responses carry their success flag
                        let echoed = decode_response(&request).unwrap();
                        assert_eq!(echoed.success, action != 0x00);

                        // A conforming peer echoes header and command, flags success and returns the data
                        let mut reply = request.clone();
                        reply[6] = 0x01;
                        let response = decode_response(&reply).unwrap();

                        assert_eq!(&response.header, header);
                        assert!(response.success);
                        assert_eq!(response.command, command);
                        assert_eq!(response.data, data);
                    }
                }
            }
        }
    }

    #[test]
    fn should_parse_response_without_data() {
        let (response, len) = Response::from_bytes(&[2, 10, b'S', b'O', b'N', b'Y', 1, 0x01, 0x30, 0]).unwrap();
        assert_eq!(len, 10);
        assert_eq!(response.data, None);
        assert_eq!(response.command, 0x0130);
    }

    #[test]
    fn should_parse_failed_response() {
        let response = decode_response(&[2, 10, b'S', b'O', b'N', b'Y', 0, 0x01, 0x02, 2, 0x01, 0x01]).unwrap();
        assert!(!response.success);
        assert_eq!(response.data, Some(0x0101));
    }

    #[test]
    fn should_report_truncated_response() {
        assert_eq!(
            decode_response(&[2, 10, b'S', b'O']),
            Err(Error::IncompleteInput { needed: 6, got: 4 })
        );
        assert_eq!(
            decode_response(&[2, 10, b'S', b'O', b'N', b'Y', 1, 0x01, 0x02, 2, 0x00]),
            Err(Error::IncompleteInput { needed: 12, got: 11 })
        );
    }

    #[test]
    fn should_reject_one_byte_data() {
        assert_eq!(
            decode_response(&[2, 10, b'S', b'O', b'N', b'Y', 1, 0x01, 0x02, 1, 0x00]),
            Err(Error::InvalidDataLength(1))
        );
    }

    #[test]
    fn should_ignore_bytes_after_response() {
        let (response, len) =
            Response::from_bytes(&[2, 10, b'S', b'O', b'N', b'Y', 1, 0x01, 0x02, 2, 0x00, 0x03, 0xFF]).unwrap();
        assert_eq!(len, 12);
        assert_eq!(response.data, Some(3));
    }

    #[test]
    fn should_strip_only_trailing_nul() {
        assert_eq!(decode_text_field(b"VPL\0VW\0\0\0").unwrap(), "VPL\0VW");
        assert_eq!(decode_text_field(b"\0\0\0\0").unwrap(), "");
        assert_eq!(decode_text_field(b"SONY").unwrap(), "SONY");
        assert_eq!(decode_text_field(&[0xFF, 0x00]), Err(Error::InvalidText));
    }

    #[test]
    fn should_parse_announcement() {
        let announcement = decode_discovery(&announcement(b"Living room\0\0"), source()).unwrap();

        assert_eq!(announcement.source, source());
        assert_eq!(announcement.header, sony());
        assert_eq!(announcement.info, DeviceInfo {
            id: "DA".into(),
            product_name: "VPL-VW320".into(),
            serial_number: 0x0012_D687,
            power_state: 3,
            location: "Living room".into(),
        });
    }

    #[test]
    fn should_parse_announcement_without_location() {
        let bytes = announcement(b"");
        assert_eq!(bytes.len(), ANNOUNCEMENT_MIN_SIZE);
        assert_eq!(decode_discovery(&bytes, source()).unwrap().info.location, "");
    }

    #[test]
    fn should_reject_short_announcement() {
        let bytes = announcement(b"");
        for len in 0..ANNOUNCEMENT_MIN_SIZE {
            assert_eq!(
                decode_discovery(&bytes[..len], source()),
                Err(Error::IncompleteInput { needed: ANNOUNCEMENT_MIN_SIZE, got: len })
            );
        }
    }
}
