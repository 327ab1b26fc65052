//! Discover and command a projector

use std::{io::{self, Read, Write}, net::{IpAddr, SocketAddr, TcpStream, UdpSocket}, time::Duration};

use tracing::{debug, trace, warn};

use crate::{commands::{self, CommandSet, PowerState}, config::Config, proto::{self, Announcement, DeviceInfo, Header, Response, PROTOCOL_VERSION}};

const ANNOUNCEMENT_BUFFER_SIZE: usize = 1028;
const RESPONSE_BUFFER_SIZE: usize = 1024;

/// A trait representing a valid SDCP stream to communicate on
pub trait SdcpStream: Read + Write {}
impl<T: Read + Write> SdcpStream for T {}

/// Opens the connection used by a single command exchange
pub trait Connector {
    /// Stream returned by [Connector::connect]
    type Stream: SdcpStream;

    /// Connect to `addr`, bounding connection, reads and writes by `timeout`
    fn connect(&mut self, addr: SocketAddr, timeout: Duration) -> io::Result<Self::Stream>;
}

/// Connect over TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&mut self, addr: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(stream)
    }
}

#[derive(Debug, Clone)]
enum Target {
    Known(IpAddr),
    Discovered(Announcement),
}

/// A projector reachable over SDCP.
///
/// A projector is either created empty and found by listening for its SDAP
/// announcement, or created from a known IP address with the factory header.
/// Every command opens its own connection and closes it once the response is read.
pub struct Projector<C: Connector = TcpConnector> {
    config: Config,
    commands: CommandSet,
    connector: C,
    target: Option<Target>,
}

impl Projector<TcpConnector> {
    /// Create a projector that will be found on the first command
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            commands: CommandSet::default(),
            connector: TcpConnector,
            target: None,
        }
    }

    /// Create a projector with a known address, ready to receive commands
    pub fn from_ip(ip: IpAddr) -> Self {
        Self {
            target: Some(Target::Known(ip)),
            ..Self::new()
        }
    }
}

impl Default for Projector<TcpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> Projector<C> {
    /// Replace ports, timeouts and default header
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replace the table of accepted settings
    pub fn with_commands(mut self, commands: CommandSet) -> Self {
        self.commands = commands;
        self
    }

    /// Open command connections through another connector
    pub fn with_connector<D: Connector>(self, connector: D) -> Projector<D> {
        Projector {
            config: self.config,
            commands: self.commands,
            connector,
            target: self.target,
        }
    }

    /// Whether an address is known, either given or discovered
    pub fn is_initialized(&self) -> bool {
        self.target.is_some()
    }

    /// Projector IP address
    pub fn address(&self) -> Option<IpAddr> {
        match &self.target {
            Some(Target::Known(ip)) => Some(*ip),
            Some(Target::Discovered(announcement)) => Some(announcement.source.ip()),
            None => None,
        }
    }

    /// Header sent with every command.
    ///
    /// For discovered projectors, the version is always [PROTOCOL_VERSION]
    /// whatever the announcement carried.
    pub fn header(&self) -> Option<Header> {
        match &self.target {
            Some(Target::Known(_)) => Some(self.config.default_header.clone()),
            Some(Target::Discovered(announcement)) => Some(Header {
                version: PROTOCOL_VERSION,
                ..announcement.header.clone()
            }),
            None => None,
        }
    }

    /// Protocol version the projector announced itself with
    pub fn announced_version(&self) -> Option<u8> {
        match &self.target {
            Some(Target::Discovered(announcement)) => Some(announcement.header.version),
            _ => None,
        }
    }

    /// Identity of a discovered projector
    pub fn info(&self) -> Option<&DeviceInfo> {
        match &self.target {
            Some(Target::Discovered(announcement)) => Some(&announcement.info),
            _ => None,
        }
    }

    /// Whether both projectors were discovered with the same serial number
    pub fn is_same_device<D: Connector>(&self, other: &Projector<D>) -> bool {
        match (self.info(), other.info()) {
            (Some(ours), Some(theirs)) => ours.serial_number == theirs.serial_number,
            _ => false,
        }
    }

    /// Listen for one SDAP announcement and take the projector address from it.
    ///
    /// Missing arguments fall back to the configured discovery address, port and timeout.
    /// Returns `Ok(false)` if nothing was received before the timeout, leaving the projector untouched.
    pub fn find(&mut self, ip: Option<IpAddr>, port: Option<u16>, timeout: Option<Duration>) -> Result<bool, crate::Error> {
        let ip = ip.unwrap_or(self.config.discovery_ip);
        let port = port.unwrap_or(self.config.discovery_port);
        let timeout = timeout.unwrap_or(self.config.discovery_timeout);
        check_timeout(timeout)?;

        let socket = UdpSocket::bind((ip, port))?;
        socket.set_read_timeout(Some(timeout))?;
        debug!(%ip, port, ?timeout, "listening for SDAP announcement");

        let mut buffer = [0_u8; ANNOUNCEMENT_BUFFER_SIZE];
        let (len, source) = match socket.recv_from(&mut buffer) {
            Ok(received) => received,
            Err(e) if is_timeout(&e) => {
                debug!("no SDAP announcement received");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        trace!(%source, bytes = ?&buffer[..len], "received SDAP announcement");

        let announcement = proto::decode_discovery(&buffer[..len], source)?;
        if announcement.header.version != PROTOCOL_VERSION {
            warn!(
                announced = announcement.header.version,
                used = PROTOCOL_VERSION,
                "projector announced another protocol version"
            );
        }
        debug!(
            %source,
            product = %announcement.info.product_name,
            serial = announcement.info.serial_number,
            "found projector"
        );

        self.target = Some(Target::Discovered(announcement));
        Ok(true)
    }

    /// Low level method to send a command and read the response.
    ///
    /// Finds the projector first if its address is unknown.
    /// Returns the data carried by the response, which must echo `command`.
    pub fn send_command(&mut self, action: u8, command: u16, data: Option<u16>, timeout: Option<Duration>) -> Result<Option<u16>, crate::Error> {
        let timeout = timeout.unwrap_or(self.config.command_timeout);
        check_timeout(timeout)?;

        if !self.is_initialized() {
            self.find(None, None, None)?;
        }
        let (Some(ip), Some(header)) = (self.address(), self.header()) else {
            return Err(crate::Error::NotFound);
        };

        let request = proto::encode_request(&header, action, command, data)?;
        let addr = SocketAddr::new(ip, self.config.command_port);
        let on_io = |e: io::Error| io_error(e, command);

        let mut stream = self.connector.connect(addr, timeout).map_err(on_io)?;
        trace!(%addr, bytes = ?request, "sending request");

        let sent = stream.write(&request).map_err(on_io)?;
        if sent != request.len() {
            return Err(crate::Error::ShortWrite { sent, expected: request.len() });
        }
        stream.flush().map_err(on_io)?;

        let response = recv_response(&mut stream).map_err(|e| match e {
            crate::Error::Io(e) => io_error(e, command),
            other => other,
        })?;
        drop(stream);

        if !response.success {
            warn!(command = response.command, data = ?response.data, "projector rejected command");
            return Err(crate::Error::Device { command: response.command, data: response.data });
        }

        if response.command != command {
            warn!(command, echoed = response.command, "response echoes another command");
            return Err(crate::Error::UnexpectedResponse(response));
        }

        debug!(command, data = ?response.data, "command succeeded");
        Ok(response.data)
    }

    /// Set projector power on or off
    pub fn set_power(&mut self, on: bool) -> Result<(), crate::Error> {
        let state = if on { PowerState::StartUp } else { PowerState::Standby };
        self.send_command(commands::ACTION_SET, commands::SET_POWER, Some(state.code()), None)?;
        Ok(())
    }

    /// Select input source by name (see [commands::INPUTS])
    pub fn set_input(&mut self, input: &str) -> Result<(), crate::Error> {
        self.set_screen("INPUT", input)
    }

    /// Select HDMI input 1 or 2
    pub fn set_hdmi_input(&mut self, hdmi: u8) -> Result<(), crate::Error> {
        match hdmi {
            1 => self.set_input("HDMI1"),
            2 => self.set_input("HDMI2"),
            other => Err(crate::Error::InvalidArgument(format!("Invalid HDMI input {other}. Expected 1 or 2"))),
        }
    }

    /// Change a setting by name, e.g. `set_screen("ASPECT_RATIO", "ZOOM_2_35")`.
    ///
    /// Unknown settings and values fail before anything is sent.
    pub fn set_screen(&mut self, setting: &str, value: &str) -> Result<(), crate::Error> {
        let (command, data) = self.commands.resolve(setting, value)?;
        self.send_command(commands::ACTION_SET, command, Some(data), None)?;
        Ok(())
    }

    /// Query current power state
    pub fn get_power_state(&mut self) -> Result<PowerState, crate::Error> {
        self.get_value(commands::GET_STATUS_POWER).map(PowerState::from_code)
    }

    /// Whether the projector is on (standby and cooling down count as off)
    pub fn get_power(&mut self) -> Result<bool, crate::Error> {
        Ok(self.get_power_state()?.is_on())
    }

    /// Query error status code
    pub fn get_error_status(&mut self) -> Result<u16, crate::Error> {
        self.get_value(commands::GET_STATUS_ERROR)
    }

    /// Query lamp timer
    pub fn get_lamp_timer(&mut self) -> Result<u16, crate::Error> {
        self.get_value(commands::GET_STATUS_LAMP_TIMER)
    }

    fn get_value(&mut self, command: u16) -> Result<u16, crate::Error> {
        self.send_command(commands::ACTION_GET, command, None, None)?
            .ok_or(crate::Error::MissingData { command })
    }
}

/// Read until a full response is buffered.
///
/// Once the fixed part of a response has arrived, a read timeout means the
/// projector will not send the data it declared and is reported as a decode error.
fn recv_response(stream: &mut impl Read) -> Result<Response, crate::Error> {
    let mut buffer = Vec::with_capacity(RESPONSE_BUFFER_SIZE);
    let mut chunk = [0_u8; RESPONSE_BUFFER_SIZE];
    loop {
        let incomplete = match Response::from_bytes(&buffer) {
            Ok((response, _)) => {
                trace!(bytes = ?buffer, "received response");
                return Ok(response);
            }
            Err(e @ proto::Error::IncompleteInput { .. }) => e,
            Err(e) => return Err(e.into()),
        };

        let read = match stream.read(&mut chunk) {
            Ok(read) => read,
            Err(e) if is_timeout(&e) && buffer.len() >= proto::FRAME_HEADER_SIZE => return Err(incomplete.into()),
            Err(e) => return Err(e.into()),
        };
        if read == 0 {
            if buffer.is_empty() {
                return Err(crate::Error::UnexpectedEndOfStream);
            }
            return Err(incomplete.into());
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
}

fn check_timeout(timeout: Duration) -> Result<(), crate::Error> {
    if timeout.is_zero() {
        return Err(crate::Error::InvalidArgument("Timeout must be greater than zero".into()));
    }
    Ok(())
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn io_error(e: io::Error, command: u16) -> crate::Error {
    if is_timeout(&e) {
        crate::Error::Timeout { command }
    } else {
        crate::Error::Io(e)
    }
}
