//! Cover domain vocabulary
//!
//! States, device classes, feature flags and services of the `cover` domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::states::{STATE_CLOSED, STATE_CLOSING, STATE_OPEN, STATE_OPENING};

/// State a cover can report
///
/// An unknown state is represented by `Option::None` wherever a cover state
/// is stored, mirroring how the host treats a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverState {
    Open,
    Opening,
    Closed,
    Closing,
}

impl CoverState {
    /// Get the state string written to the state machine
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverState::Open => STATE_OPEN,
            CoverState::Opening => STATE_OPENING,
            CoverState::Closed => STATE_CLOSED,
            CoverState::Closing => STATE_CLOSING,
        }
    }
}

impl fmt::Display for CoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device class of a cover, used by frontends to pick icons and wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverDeviceClass {
    Awning,
    Blind,
    Curtain,
    Damper,
    Door,
    Garage,
    Gate,
    Shade,
    Shutter,
    Window,
}

impl CoverDeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverDeviceClass::Awning => "awning",
            CoverDeviceClass::Blind => "blind",
            CoverDeviceClass::Curtain => "curtain",
            CoverDeviceClass::Damper => "damper",
            CoverDeviceClass::Door => "door",
            CoverDeviceClass::Garage => "garage",
            CoverDeviceClass::Gate => "gate",
            CoverDeviceClass::Shade => "shade",
            CoverDeviceClass::Shutter => "shutter",
            CoverDeviceClass::Window => "window",
        }
    }
}

impl fmt::Display for CoverDeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Features a cover entity supports
    ///
    /// Values match the `supported_features` attribute of the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CoverEntityFeature: u32 {
        const OPEN = 1 << 0;
        const CLOSE = 1 << 1;
        const SET_POSITION = 1 << 2;
        const STOP = 1 << 3;
        const OPEN_TILT = 1 << 4;
        const CLOSE_TILT = 1 << 5;
        const STOP_TILT = 1 << 6;
        const SET_TILT_POSITION = 1 << 7;
    }
}

/// Error returned when parsing an unknown cover service name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown cover service: {0}")]
pub struct UnknownService(pub String);

/// Services of the cover domain that act on the travel of a cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverService {
    OpenCover,
    CloseCover,
    StopCover,
}

impl CoverService {
    /// Get the service name as registered in the `cover` domain
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverService::OpenCover => "open_cover",
            CoverService::CloseCover => "close_cover",
            CoverService::StopCover => "stop_cover",
        }
    }

    /// Feature an entity must support before the service can be called on it
    pub fn required_feature(&self) -> CoverEntityFeature {
        match self {
            CoverService::OpenCover => CoverEntityFeature::OPEN,
            CoverService::CloseCover => CoverEntityFeature::CLOSE,
            CoverService::StopCover => CoverEntityFeature::STOP,
        }
    }
}

impl FromStr for CoverService {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open_cover" => Ok(CoverService::OpenCover),
            "close_cover" => Ok(CoverService::CloseCover),
            "stop_cover" => Ok(CoverService::StopCover),
            other => Err(UnknownService(other.to_string())),
        }
    }
}

impl fmt::Display for CoverService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
