//! Sensor records
//!
//! Decodes one telemetry line of the form
//! `light,soundPressure,motionX,motionY,motionZ,temperature` into a typed record.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of comma-separated fields in a telemetry line
pub const FIELD_COUNT: usize = 6;

/// Field names in wire order
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "light",
    "soundPressure",
    "motionX",
    "motionY",
    "motionZ",
    "temperature",
];

/// Reasons a line fails to decode
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeError {
    /// Nothing but whitespace
    #[error("empty line")]
    Empty,

    /// Wrong number of comma-separated fields
    #[error("expected 6 fields, found {found}")]
    FieldCount {
        /// Fields present
        found: usize,
    },

    /// A field is not a finite decimal number
    #[error("field {index} is not a number: {token:?}")]
    InvalidNumber {
        /// Zero-based field position
        index: usize,
        /// The field as received
        token: String,
    },
}

/// The six readings carried by a valid telemetry line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReadings {
    /// Ambient light level
    pub light: f64,
    /// Sound pressure level
    pub sound_pressure: f64,
    /// Acceleration along X
    pub motion_x: f64,
    /// Acceleration along Y
    pub motion_y: f64,
    /// Acceleration along Z
    pub motion_z: f64,
    /// Temperature
    pub temperature: f64,
}

impl SensorReadings {
    /// Build readings from values in wire order
    pub fn from_array(values: [f64; FIELD_COUNT]) -> Self {
        let [light, sound_pressure, motion_x, motion_y, motion_z, temperature] = values;
        Self {
            light,
            sound_pressure,
            motion_x,
            motion_y,
            motion_z,
            temperature,
        }
    }

    /// Values in wire order
    pub fn to_array(&self) -> [f64; FIELD_COUNT] {
        [
            self.light,
            self.sound_pressure,
            self.motion_x,
            self.motion_y,
            self.motion_z,
            self.temperature,
        ]
    }
}

impl FromStr for SensorReadings {
    type Err = DecodeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        if line.trim().is_empty() {
            return Err(DecodeError::Empty);
        }

        let found = line.split(',').count();
        if found != FIELD_COUNT {
            return Err(DecodeError::FieldCount { found });
        }

        let mut values = [0.0; FIELD_COUNT];
        for (index, token) in line.split(',').enumerate() {
            values[index] = parse_field(token).ok_or_else(|| DecodeError::InvalidNumber {
                index,
                token: token.to_string(),
            })?;
        }

        Ok(Self::from_array(values))
    }
}

/// Parse one field; surrounding whitespace is tolerated, non-finite values are not
fn parse_field(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

impl fmt::Display for SensorReadings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "light: {}, soundPressure: {}, acc: {{{},{},{}}}, temperature: {}",
            self.light,
            self.sound_pressure,
            self.motion_x,
            self.motion_y,
            self.motion_z,
            self.temperature
        )
    }
}

/// One decoded telemetry line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SensorRecord {
    /// All six fields decoded
    Valid(SensorReadings),
    /// The line was malformed; no readings are available
    Invalid {
        /// The offending line
        line: String,
        /// Why decoding failed
        error: DecodeError,
    },
}

impl SensorRecord {
    /// Whether the line decoded into six readings
    pub fn is_valid(&self) -> bool {
        matches!(self, SensorRecord::Valid(_))
    }

    /// Readings, if valid
    pub fn readings(&self) -> Option<&SensorReadings> {
        match self {
            SensorRecord::Valid(readings) => Some(readings),
            SensorRecord::Invalid { .. } => None,
        }
    }

    /// Decode failure, if invalid
    pub fn error(&self) -> Option<&DecodeError> {
        match self {
            SensorRecord::Valid(_) => None,
            SensorRecord::Invalid { error, .. } => Some(error),
        }
    }

    /// Light reading, if valid
    pub fn light(&self) -> Option<f64> {
        self.readings().map(|r| r.light)
    }

    /// Sound pressure reading, if valid
    pub fn sound_pressure(&self) -> Option<f64> {
        self.readings().map(|r| r.sound_pressure)
    }

    /// X acceleration, if valid
    pub fn motion_x(&self) -> Option<f64> {
        self.readings().map(|r| r.motion_x)
    }

    /// Y acceleration, if valid
    pub fn motion_y(&self) -> Option<f64> {
        self.readings().map(|r| r.motion_y)
    }

    /// Z acceleration, if valid
    pub fn motion_z(&self) -> Option<f64> {
        self.readings().map(|r| r.motion_z)
    }

    /// Temperature reading, if valid
    pub fn temperature(&self) -> Option<f64> {
        self.readings().map(|r| r.temperature)
    }
}

impl fmt::Display for SensorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorRecord::Valid(readings) => fmt::Display::fmt(readings, f),
            SensorRecord::Invalid { .. } => f.write_str("BadData..."),
        }
    }
}

/// Decode a telemetry line into a record
///
/// Never panics; any malformed input yields [`SensorRecord::Invalid`].
pub fn decode(line: &str) -> SensorRecord {
    match line.parse::<SensorReadings>() {
        Ok(readings) => SensorRecord::Valid(readings),
        Err(error) => SensorRecord::Invalid {
            line: line.to_string(),
            error,
        },
    }
}
