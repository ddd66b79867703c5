//! Device session access.
//!
//! An MDIS path is driven through five calls: open, setstat, getstat, read
//! and close. [`DeviceSession`] is that capability; it is implemented by
//! [`MdisSession`] for real hardware and by [`SimSession`] for the in-process
//! simulator.
//!
//! [`Session`] owns one open device session for the duration of a tool run.
//! It names each failing call in the returned error and closes the device on
//! every exit path: either explicitly through [`Session::close`] or, if the
//! caller bails out early, when it is dropped. A session that failed to open
//! never exists, so close is only ever attempted after a successful open.

pub mod mdis;
pub mod sim;

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::SimulatorSettings;
use crate::error::{M36Error, Result, SessionError};

pub use mdis::MdisSession;
pub use sim::{SessionCall, SimDevice, SimOp, SimSession};

/// Status codes used with setstat/getstat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// `M_MK_CH_CURRENT`: channel addressed by the next call
    CurrentChannel,
    /// `M_MK_IO_MODE`: single channel or auto-increment reads
    IoMode,
    /// `M_LL_CH_NUMBER`: number of channels (getstat only)
    ChannelCount,
    /// `M36_CH_ENABLE`: enable/disable the current channel
    ChannelEnable,
    /// `M36_CH_GAIN`: gain code of the current channel (0..=3)
    ChannelGain,
    /// `M36_BIPOLAR`: measuring mode for all channels
    Bipolar,
    /// `M36_EXT_TRIG`: sampling trigger
    ExternalTrigger,
    /// `M36_EXT_PIN`: state of the binary input (getstat only)
    ExternalPin,
    /// `M36_CALIBRATE`: start calibration (setstat only)
    Calibrate,
    /// `M36_SINGLE_ENDED`: type of input adapter (getstat only)
    SingleEnded,
    /// `M36_NBR_ENABLED_CH`: number of enabled channels (getstat only)
    EnabledChannels,
    /// `M36_GET_RAWDAT`: raw 18-bit value of the current channel (getstat only)
    RawData,
}

impl StatusCode {
    /// Every status code the tools know about.
    pub const ALL: [StatusCode; 12] = [
        StatusCode::CurrentChannel,
        StatusCode::IoMode,
        StatusCode::ChannelCount,
        StatusCode::ChannelEnable,
        StatusCode::ChannelGain,
        StatusCode::Bipolar,
        StatusCode::ExternalTrigger,
        StatusCode::ExternalPin,
        StatusCode::Calibrate,
        StatusCode::SingleEnded,
        StatusCode::EnabledChannels,
        StatusCode::RawData,
    ];

    /// Numeric code passed to `M_setstat`/`M_getstat`.
    pub fn raw(self) -> i32 {
        (match self {
            Self::CurrentChannel => mdis_sys::M_MK_CH_CURRENT,
            Self::IoMode => mdis_sys::M_MK_IO_MODE,
            Self::ChannelCount => mdis_sys::M_LL_CH_NUMBER,
            Self::ChannelEnable => mdis_sys::M36_CH_ENABLE,
            Self::ChannelGain => mdis_sys::M36_CH_GAIN,
            Self::Bipolar => mdis_sys::M36_BIPOLAR,
            Self::ExternalTrigger => mdis_sys::M36_EXT_TRIG,
            Self::ExternalPin => mdis_sys::M36_EXT_PIN,
            Self::Calibrate => mdis_sys::M36_CALIBRATE,
            Self::SingleEnded => mdis_sys::M36_SINGLE_ENDED,
            Self::EnabledChannels => mdis_sys::M36_NBR_ENABLED_CH,
            Self::RawData => mdis_sys::M36_GET_RAWDAT,
        }) as i32
    }

    /// Look up a status code by its numeric value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.raw() == raw)
    }

    /// MDIS symbol name, as used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::CurrentChannel => "M_MK_CH_CURRENT",
            Self::IoMode => "M_MK_IO_MODE",
            Self::ChannelCount => "M_LL_CH_NUMBER",
            Self::ChannelEnable => "M36_CH_ENABLE",
            Self::ChannelGain => "M36_CH_GAIN",
            Self::Bipolar => "M36_BIPOLAR",
            Self::ExternalTrigger => "M36_EXT_TRIG",
            Self::ExternalPin => "M36_EXT_PIN",
            Self::Calibrate => "M36_CALIBRATE",
            Self::SingleEnded => "M36_SINGLE_ENDED",
            Self::EnabledChannels => "M36_NBR_ENABLED_CH",
            Self::RawData => "M36_GET_RAWDAT",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read mode selected with [`StatusCode::IoMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    /// Every read returns the current channel
    Single,
    /// Every read advances the current channel
    AutoIncrement,
}

impl IoMode {
    /// Value written to `M_MK_IO_MODE`.
    pub fn raw(self) -> i32 {
        (match self {
            Self::Single => mdis_sys::M_IO_EXEC,
            Self::AutoIncrement => mdis_sys::M_IO_EXEC_INC,
        }) as i32
    }
}

/// Capability interface of an open device path.
///
/// Every call reports failure through its own [`SessionError`].
pub trait DeviceSession {
    /// Device name the session was opened with.
    fn device(&self) -> &str;

    /// Write a configuration value (setstat).
    fn set_config(&mut self, code: StatusCode, value: i32) -> std::result::Result<(), SessionError>;

    /// Read a configuration value (getstat).
    fn get_config(&mut self, code: StatusCode) -> std::result::Result<i32, SessionError>;

    /// Blocking read of one sample.
    fn read(&mut self) -> std::result::Result<i32, SessionError>;

    /// Release the device path. Called at most once.
    fn close(&mut self) -> std::result::Result<(), SessionError>;
}

/// Opens device sessions by name.
pub trait SessionOpener {
    /// Open `device`, returning a live session.
    fn open(&self, device: &str) -> std::result::Result<Box<dyn DeviceSession>, SessionError>;
}

/// Check whether a device name selects the simulator.
pub fn is_simulated(device: &str) -> bool {
    device.starts_with("sim")
}

/// Opener used by the tools: `sim*` names get a simulator, everything else
/// goes to MDIS.
#[derive(Debug, Clone, Default)]
pub struct DeviceOpener {
    simulator: SimulatorSettings,
}

impl DeviceOpener {
    /// Create an opener whose simulated devices use `simulator`.
    pub fn new(simulator: SimulatorSettings) -> Self {
        Self { simulator }
    }
}

impl SessionOpener for DeviceOpener {
    fn open(&self, device: &str) -> std::result::Result<Box<dyn DeviceSession>, SessionError> {
        if is_simulated(device) {
            // nothing inspects the call log of a tool-opened simulator
            SimDevice::from_settings(&self.simulator)
                .with_call_log_limit(0)
                .open(device)
        } else {
            Ok(Box::new(MdisSession::open(device)?))
        }
    }
}

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Device path is held
    Open,
    /// Device path was released
    Closed,
}

/// An open device session with guaranteed release.
pub struct Session {
    inner: Box<dyn DeviceSession>,
    state: SessionState,
}

impl Session {
    /// Open `device` through `opener`.
    ///
    /// # Errors
    ///
    /// Returns [`M36Error::Device`] for operation `open`. Nothing needs closing
    /// in that case.
    pub fn open(opener: &dyn SessionOpener, device: &str) -> Result<Self> {
        let inner = opener
            .open(device)
            .map_err(|e| M36Error::device("open", e))?;

        info!(device = %device, "Opened device session");

        Ok(Self {
            inner,
            state: SessionState::Open,
        })
    }

    /// Device name.
    pub fn device(&self) -> &str {
        self.inner.device()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Write a configuration value.
    pub fn set(&mut self, code: StatusCode, value: i32) -> Result<()> {
        debug!(device = %self.device(), code = %code, value, "setstat");
        self.inner
            .set_config(code, value)
            .map_err(|e| M36Error::device(format!("setstat {}", code), e))
    }

    /// Read a configuration value.
    pub fn get(&mut self, code: StatusCode) -> Result<i32> {
        let value = self
            .inner
            .get_config(code)
            .map_err(|e| M36Error::device(format!("getstat {}", code), e))?;
        debug!(device = %self.device(), code = %code, value, "getstat");
        Ok(value)
    }

    /// Read one sample.
    pub fn read(&mut self) -> Result<i32> {
        self.inner.read().map_err(|e| M36Error::device("read", e))
    }

    /// Release the device.
    ///
    /// # Errors
    ///
    /// Returns [`M36Error::Device`] for operation `close` if the device
    /// reported an error. The session counts as closed either way.
    pub fn close(mut self) -> Result<()> {
        self.release().map_err(|e| M36Error::device("close", e))
    }

    fn release(&mut self) -> std::result::Result<(), SessionError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        info!(device = %self.inner.device(), "Closing device session");
        self.inner.close()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(device = %self.inner.device(), error = %e, "Error closing device session");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("device", &self.device())
            .field("state", &self.state)
            .finish()
    }
}
