//! Set of action codes, command codes and permitted setting values
//!
//! Codes follow the VPL-VW320/VW520 protocol manual.

use crate::Error;

/// Read a value from the projector
pub const ACTION_GET: u8 = 0x01;

/// Write a value to the projector
pub const ACTION_SET: u8 = 0x00;

/// Turn projector on or off (data is a [PowerState] code)
pub const SET_POWER: u16 = 0x0130;

/// Select input source
pub const INPUT: u16 = 0x0001;

/// Select aspect ratio
pub const ASPECT_RATIO: u16 = 0x0020;

/// Select picture position
pub const PICTURE_POSITION: u16 = 0x0066;

/// Select dynamic range (HDR) mode
pub const DYNAMIC_RANGE: u16 = 0x007C;

/// Query error status
pub const GET_STATUS_ERROR: u16 = 0x0101;

/// Query power status
pub const GET_STATUS_POWER: u16 = 0x0102;

/// Query lamp timer
pub const GET_STATUS_LAMP_TIMER: u16 = 0x0113;

/// Permitted input sources
pub const INPUTS: &[(&str, u16)] = &[
    ("HDMI1", 0x0002),
    ("HDMI2", 0x0003),
];

/// Permitted aspect ratios
pub const ASPECT_RATIOS: &[(&str, u16)] = &[
    ("NORMAL", 0x0001),
    ("V_STRETCH", 0x000B),
    ("ZOOM_1_85", 0x000C),
    ("ZOOM_2_35", 0x000D),
    ("STRETCH", 0x000E),
    ("SQUEEZE", 0x000F),
];

/// Permitted picture positions
pub const PICTURE_POSITIONS: &[(&str, u16)] = &[
    ("1_85", 0x0000),
    ("2_35", 0x0001),
    ("CUSTOM_1", 0x0002),
    ("CUSTOM_2", 0x0003),
    ("CUSTOM_3", 0x0004),
    ("CUSTOM_4", 0x0005),
    ("CUSTOM_5", 0x0006),
];

/// Permitted dynamic range modes
pub const DYNAMIC_RANGES: &[(&str, u16)] = &[
    ("OFF", 0x0000),
    ("ON", 0x0001),
    ("AUTO", 0x0002),
];

/// Power state reported by [GET_STATUS_POWER] and announced over SDAP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Standby
    Standby,
    /// Starting up
    StartUp,
    /// Starting up, lamp warming
    StartUpLamp,
    /// Powered on
    PowerOn,
    /// Cooling down
    Cooling,
    /// Cooling down, second stage
    Cooling2,
    /// Code missing from the protocol manual
    Unknown(u16),
}

impl PowerState {
    /// Map a wire code to a power state
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => Self::Standby,
            1 => Self::StartUp,
            2 => Self::StartUpLamp,
            3 => Self::PowerOn,
            4 => Self::Cooling,
            5 => Self::Cooling2,
            other => Self::Unknown(other),
        }
    }

    /// Wire code of this power state
    pub fn code(&self) -> u16 {
        match self {
            Self::Standby => 0,
            Self::StartUp => 1,
            Self::StartUpLamp => 2,
            Self::PowerOn => 3,
            Self::Cooling => 4,
            Self::Cooling2 => 5,
            Self::Unknown(code) => *code,
        }
    }

    /// Whether the projector counts as on.
    ///
    /// Unknown codes count as on.
    pub fn is_on(&self) -> bool {
        !matches!(self, Self::Standby | Self::Cooling | Self::Cooling2)
    }
}

/// A named setting and the values it accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    /// Name used by callers, e.g. "ASPECT_RATIO"
    pub name: String,
    /// Command code sent with [ACTION_SET]
    pub command: u16,
    /// Permitted value names and their codes
    pub values: Vec<(String, u16)>,
}

impl Setting {
    /// Create a setting from any list of named values
    pub fn new<N: Into<String>>(name: impl Into<String>, command: u16, values: impl IntoIterator<Item = (N, u16)>) -> Self {
        Self {
            name: name.into(),
            command,
            values: values.into_iter().map(|(name, code)| (name.into(), code)).collect(),
        }
    }

    /// Look up the code of a value name
    pub fn value(&self, name: &str) -> Option<u16> {
        self.values.iter().find(|(it, _)| it == name).map(|(_, code)| *code)
    }
}

/// Lookup table of settings a projector accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    settings: Vec<Setting>,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::new(vec![
            Setting::new("INPUT", INPUT, INPUTS.iter().copied()),
            Setting::new("ASPECT_RATIO", ASPECT_RATIO, ASPECT_RATIOS.iter().copied()),
            Setting::new("PICTURE_POSITION", PICTURE_POSITION, PICTURE_POSITIONS.iter().copied()),
            Setting::new("DYNAMIC_RANGE", DYNAMIC_RANGE, DYNAMIC_RANGES.iter().copied()),
        ])
    }
}

impl CommandSet {
    /// Create a lookup table from arbitrary settings
    pub fn new(settings: Vec<Setting>) -> Self {
        Self { settings }
    }

    /// Add a setting, replacing any setting with the same name
    pub fn with_setting(mut self, setting: Setting) -> Self {
        self.settings.retain(|it| it.name != setting.name);
        self.settings.push(setting);
        self
    }

    /// Find a setting by name
    pub fn setting(&self, name: &str) -> Option<&Setting> {
        self.settings.iter().find(|it| it.name == name)
    }

    /// Resolve a setting name and value name into a `(command, data)` pair
    pub fn resolve(&self, setting: &str, value: &str) -> Result<(u16, u16), Error> {
        let Some(found) = self.setting(setting) else {
            return Err(Error::InvalidArgument(format!("Invalid setting {setting}")));
        };

        let Some(code) = found.value(value) else {
            let expected = found.values.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
            return Err(Error::InvalidArgument(format!(
                "Invalid value {value} for {setting}. Expected one of: {}",
                expected.join(", ")
            )));
        };

        Ok((found.command, code))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_resolve_known_values() {
        let commands = CommandSet::default();
        assert_eq!(commands.resolve("ASPECT_RATIO", "STRETCH").unwrap(), (ASPECT_RATIO, 0x000E));
        assert_eq!(commands.resolve("PICTURE_POSITION", "2_35").unwrap(), (PICTURE_POSITION, 0x0001));
        assert_eq!(commands.resolve("DYNAMIC_RANGE", "AUTO").unwrap(), (DYNAMIC_RANGE, 0x0002));
        assert_eq!(commands.resolve("INPUT", "HDMI2").unwrap(), (INPUT, 0x0003));
    }

    #[test]
    fn should_reject_unknown_setting_or_value() {
        let commands = CommandSet::default();
        assert!(matches!(commands.resolve("BRIGHTNESS", "50"), Err(Error::InvalidArgument(_))));

        let Err(Error::InvalidArgument(message)) = commands.resolve("ASPECT_RATIO", "WIDE") else {
            panic!("expected invalid argument");
        };
        assert!(message.contains("NORMAL"));
    }

    #[test]
    fn should_replace_setting() {
        let commands = CommandSet::default()
            .with_setting(Setting::new("ASPECT_RATIO", 0x0099, [("CINEMA", 0x0000), ("GAME", 0x0005)]));

        assert_eq!(commands.resolve("ASPECT_RATIO", "GAME").unwrap(), (0x0099, 0x0005));
        assert!(commands.resolve("ASPECT_RATIO", "NORMAL").is_err());
    }

    #[test]
    fn should_resolve_settings_built_at_runtime() {
        let loaded = "LAMP_CONTROL=0x001A:LOW=0,HIGH=1";
        let (name, rest) = loaded.split_once('=').unwrap();
        let (command, values) = rest.split_once(':').unwrap();
        let command = u16::from_str_radix(command.trim_start_matches("0x"), 16).unwrap();
        let values = values
            .split(',')
            .map(|pair| pair.split_once('=').unwrap())
            .map(|(name, code)| (name.to_owned(), code.parse::<u16>().unwrap()))
            .collect::<Vec<_>>();

        let commands = CommandSet::default().with_setting(Setting::new(name.to_owned(), command, values));
        assert_eq!(commands.resolve("LAMP_CONTROL", "HIGH").unwrap(), (0x001A, 1));
        assert_eq!(commands.setting("LAMP_CONTROL").unwrap().values.len(), 2);
        assert!(commands.resolve("LAMP_CONTROL", "MEDIUM").is_err());
    }

    #[test]
    fn should_classify_power_states() {
        assert!(!PowerState::from_code(0).is_on());
        assert!(!PowerState::from_code(4).is_on());
        assert!(!PowerState::from_code(5).is_on());
        assert!(PowerState::from_code(1).is_on());
        assert!(PowerState::from_code(3).is_on());
        assert_eq!(PowerState::from_code(0x42), PowerState::Unknown(0x42));
        assert!(PowerState::Unknown(0x42).is_on());
        assert_eq!(PowerState::from_code(2).code(), 2);
    }
}
