//! In-process M36 simulator.
//!
//! [`SimDevice`] models the register state of one M36 module: polarity and
//! trigger for the whole board, enable and gain per channel, the current
//! channel and the read mode. Sessions opened from it share that state, so a
//! test can keep the `SimDevice` handle and inspect what a tool did after the
//! tool has closed its session.
//!
//! Samples are queued per channel with [`SimDevice::with_samples`]. A channel
//! with an empty queue returns a ramp that starts at `channel << 12`.
//!
//! Failures are injected per operation:
//!
//! ```
//! use m36_daq::error::SessionError;
//! use m36_daq::session::{SimDevice, SimOp, StatusCode};
//!
//! let device = SimDevice::new(8)
//!     .fail_on(SimOp::Set(StatusCode::ChannelGain), SessionError::new(0x0a03, "illegal parameter"));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::{DeviceSession, IoMode, SessionOpener, StatusCode};
use crate::config::SimulatorSettings;
use crate::error::SessionError;

const RAMP_STEP: i32 = 0x0101;

/// Calls kept in the log; older entries are dropped first.
pub const DEFAULT_CALL_LOG_LIMIT: usize = 1024;

/// A call made against a simulated device, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    /// Device opened by name
    Open(String),
    /// setstat
    Set(StatusCode, i32),
    /// getstat
    Get(StatusCode),
    /// Sample read
    Read,
    /// Device closed
    Close,
}

/// Operation selector for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOp {
    /// Opening the device
    Open,
    /// setstat with this code
    Set(StatusCode),
    /// getstat with this code
    Get(StatusCode),
    /// Reading a sample
    Read,
    /// Closing the device
    Close,
}

#[derive(Debug, Clone)]
struct Fault {
    /// Calls that still succeed before the fault triggers
    remaining: u32,
    error: SessionError,
}

#[derive(Debug, Clone, Default)]
struct SimChannel {
    enabled: bool,
    gain: i32,
    samples: VecDeque<i32>,
    ramp: i32,
}

#[derive(Debug)]
struct SimState {
    channels: Vec<SimChannel>,
    single_ended: bool,
    bipolar: i32,
    ext_trig: i32,
    ext_pin: i32,
    current: usize,
    io_mode: i32,
    calibrations: u32,
    open: bool,
    calls: VecDeque<SessionCall>,
    call_log_limit: usize,
    faults: HashMap<SimOp, Fault>,
}

impl SimState {
    fn new(channels: u32, single_ended: bool) -> Self {
        let channels = (0..channels)
            .map(|ch| SimChannel {
                ramp: ((ch as i32) << 12) & 0xffff,
                ..Default::default()
            })
            .collect();

        Self {
            channels,
            single_ended,
            bipolar: 0,
            ext_trig: 0,
            ext_pin: 0,
            current: 0,
            io_mode: IoMode::Single.raw(),
            calibrations: 0,
            open: false,
            calls: VecDeque::new(),
            call_log_limit: DEFAULT_CALL_LOG_LIMIT,
            faults: HashMap::new(),
        }
    }

    fn record(&mut self, call: SessionCall) {
        if self.call_log_limit == 0 {
            return;
        }
        if self.calls.len() == self.call_log_limit {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }

    fn check_fault(&mut self, op: SimOp) -> Result<(), SessionError> {
        match self.faults.get_mut(&op) {
            Some(fault) if fault.remaining == 0 => Err(fault.error.clone()),
            Some(fault) => {
                fault.remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn check_open(&self) -> Result<(), SessionError> {
        if self.open {
            Ok(())
        } else {
            Err(SessionError::new(mdis_sys::ERR_LL_ILL_PARAM as u32, "path not open"))
        }
    }

    fn set(&mut self, code: StatusCode, value: i32) -> Result<(), SessionError> {
        match code {
            StatusCode::CurrentChannel => {
                self.current = self.channel_index(value)?;
            }
            StatusCode::IoMode => {
                if value != IoMode::Single.raw() && value != IoMode::AutoIncrement.raw() {
                    return Err(illegal_param(code, value));
                }
                self.io_mode = value;
            }
            StatusCode::ChannelEnable => {
                let enabled = flag(code, value)?;
                self.channels[self.current].enabled = enabled;
            }
            StatusCode::ChannelGain => {
                // x16 is a jumper setting, not a register value
                if !(0..=3).contains(&value) {
                    return Err(illegal_param(code, value));
                }
                self.channels[self.current].gain = value;
            }
            StatusCode::Bipolar => {
                self.bipolar = i32::from(flag(code, value)?);
            }
            StatusCode::ExternalTrigger => {
                self.ext_trig = i32::from(flag(code, value)?);
            }
            StatusCode::Calibrate => {
                self.calibrations += 1;
            }
            StatusCode::ChannelCount
            | StatusCode::ExternalPin
            | StatusCode::SingleEnded
            | StatusCode::EnabledChannels
            | StatusCode::RawData => return Err(unknown_code(code)),
        }
        Ok(())
    }

    fn get(&mut self, code: StatusCode) -> Result<i32, SessionError> {
        let value = match code {
            StatusCode::CurrentChannel => self.current as i32,
            StatusCode::IoMode => self.io_mode,
            StatusCode::ChannelCount => self.channels.len() as i32,
            StatusCode::ChannelEnable => i32::from(self.channels[self.current].enabled),
            StatusCode::ChannelGain => self.channels[self.current].gain,
            StatusCode::Bipolar => self.bipolar,
            StatusCode::ExternalTrigger => self.ext_trig,
            StatusCode::ExternalPin => self.ext_pin,
            StatusCode::SingleEnded => i32::from(self.single_ended),
            StatusCode::EnabledChannels => {
                self.channels.iter().filter(|ch| ch.enabled).count() as i32
            }
            StatusCode::RawData => {
                let channel = &self.channels[self.current];
                let next = channel.samples.front().copied().unwrap_or(channel.ramp);
                (next & 0xffff) << 2
            }
            StatusCode::Calibrate => return Err(unknown_code(code)),
        };
        Ok(value)
    }

    fn read(&mut self) -> Result<i32, SessionError> {
        let index = self.current;
        let channel = &mut self.channels[index];
        if !channel.enabled {
            return Err(SessionError::new(
                mdis_sys::ERR_LL_READ as u32,
                format!("channel {} not enabled", index),
            ));
        }

        let value = match channel.samples.pop_front() {
            Some(sample) => sample,
            None => {
                let sample = channel.ramp;
                channel.ramp = (channel.ramp + RAMP_STEP) & 0xffff;
                sample
            }
        } & 0xffff;

        if self.io_mode == IoMode::AutoIncrement.raw() {
            self.current = (self.current + 1) % self.channels.len();
        }
        Ok(value)
    }

    fn channel_index(&self, value: i32) -> Result<usize, SessionError> {
        usize::try_from(value)
            .ok()
            .filter(|&ch| ch < self.channels.len())
            .ok_or_else(|| {
                SessionError::new(
                    mdis_sys::ERR_LL_ILL_CHAN as u32,
                    format!("illegal channel {} (device has {})", value, self.channels.len()),
                )
            })
    }
}

fn flag(code: StatusCode, value: i32) -> Result<bool, SessionError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(illegal_param(code, value)),
    }
}

fn illegal_param(code: StatusCode, value: i32) -> SessionError {
    SessionError::new(
        mdis_sys::ERR_LL_ILL_PARAM as u32,
        format!("illegal parameter {} for {}", value, code),
    )
}

fn unknown_code(code: StatusCode) -> SessionError {
    SessionError::new(
        mdis_sys::ERR_LL_UNK_CODE as u32,
        format!("unknown status code {}", code),
    )
}

/// Handle to a simulated M36 module.
#[derive(Clone)]
pub struct SimDevice {
    state: Arc<Mutex<SimState>>,
}

impl SimDevice {
    /// Create a simulated module with `channels` differential inputs.
    pub fn new(channels: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new(channels.max(1), false))),
        }
    }

    /// Create a simulated module from settings.
    pub fn from_settings(settings: &SimulatorSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new(
                settings.channels.max(1),
                settings.single_ended,
            ))),
        }
    }

    /// Queue samples returned by reads of `channel`.
    ///
    /// Values are truncated to 16 bits, so negative bipolar codes can be
    /// queued directly.
    pub fn with_samples(self, channel: u32, samples: impl IntoIterator<Item = i32>) -> Self {
        {
            let mut state = self.state.lock();
            if let Some(ch) = state.channels.get_mut(channel as usize) {
                ch.samples.extend(samples);
            }
        }
        self
    }

    /// Set the state of the external binary input.
    pub fn with_external_pin(self, high: bool) -> Self {
        self.state.lock().ext_pin = i32::from(high);
        self
    }

    /// Make every call of `op` fail with `error`.
    pub fn fail_on(self, op: SimOp, error: SessionError) -> Self {
        self.fail_after(op, 0, error)
    }

    /// Let `successes` calls of `op` through, then fail every following one.
    pub fn fail_after(self, op: SimOp, successes: u32, error: SessionError) -> Self {
        self.state.lock().faults.insert(
            op,
            Fault {
                remaining: successes,
                error,
            },
        );
        self
    }

    /// Keep at most `limit` calls in the log; 0 turns the log off.
    pub fn with_call_log_limit(self, limit: usize) -> Self {
        {
            let mut state = self.state.lock();
            state.call_log_limit = limit;
            while state.calls.len() > limit {
                state.calls.pop_front();
            }
        }
        self
    }

    /// Calls made so far, including failed ones, oldest first.
    ///
    /// Only the most recent calls up to the log limit are kept.
    pub fn calls(&self) -> Vec<SessionCall> {
        self.state.lock().calls.iter().cloned().collect()
    }

    /// Whether a session currently holds the device.
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Number of channels.
    pub fn channels(&self) -> u32 {
        self.state.lock().channels.len() as u32
    }

    /// Whether `channel` is enabled.
    pub fn is_enabled(&self, channel: u32) -> bool {
        self.state
            .lock()
            .channels
            .get(channel as usize)
            .map(|ch| ch.enabled)
            .unwrap_or(false)
    }

    /// Gain code register of `channel`.
    pub fn gain_code(&self, channel: u32) -> Option<i32> {
        self.state.lock().channels.get(channel as usize).map(|ch| ch.gain)
    }

    /// Number of calibrations started.
    pub fn calibrations(&self) -> u32 {
        self.state.lock().calibrations
    }

    /// Open a session on this device.
    pub fn session(&self, device: &str) -> Result<SimSession, SessionError> {
        let mut state = self.state.lock();
        state.record(SessionCall::Open(device.to_string()));
        state.check_fault(SimOp::Open)?;
        if state.open {
            return Err(SessionError::new(
                mdis_sys::ERR_LL_ILL_PARAM as u32,
                format!("device {} already open", device),
            ));
        }
        state.open = true;
        debug!(device = %device, channels = state.channels.len(), "Simulated M36 opened");

        Ok(SimSession {
            device: device.to_string(),
            state: Arc::clone(&self.state),
        })
    }
}

impl SessionOpener for SimDevice {
    fn open(&self, device: &str) -> Result<Box<dyn DeviceSession>, SessionError> {
        Ok(Box::new(self.session(device)?))
    }
}

impl std::fmt::Debug for SimDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimDevice")
            .field("channels", &state.channels.len())
            .field("open", &state.open)
            .field("calls", &state.calls.len())
            .finish()
    }
}

/// Session on a [`SimDevice`].
pub struct SimSession {
    device: String,
    state: Arc<Mutex<SimState>>,
}

impl DeviceSession for SimSession {
    fn device(&self) -> &str {
        &self.device
    }

    fn set_config(&mut self, code: StatusCode, value: i32) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.record(SessionCall::Set(code, value));
        state.check_open()?;
        state.check_fault(SimOp::Set(code))?;
        state.set(code, value)
    }

    fn get_config(&mut self, code: StatusCode) -> Result<i32, SessionError> {
        let mut state = self.state.lock();
        state.record(SessionCall::Get(code));
        state.check_open()?;
        state.check_fault(SimOp::Get(code))?;
        state.get(code)
    }

    fn read(&mut self) -> Result<i32, SessionError> {
        let mut state = self.state.lock();
        state.record(SessionCall::Read);
        state.check_open()?;
        state.check_fault(SimOp::Read)?;
        state.read()
    }

    fn close(&mut self) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.record(SessionCall::Close);
        state.check_open()?;
        // the path is gone even if the close reports an error
        state.open = false;
        state.check_fault(SimOp::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(device: &SimDevice) -> SimSession {
        device.session("sim0").unwrap()
    }

    #[test]
    fn test_read_requires_enabled_channel() {
        let device = SimDevice::new(4);
        let mut session = open(&device);
        assert!(session.read().is_err());

        session.set_config(StatusCode::ChannelEnable, 1).unwrap();
        assert!(session.read().is_ok());
    }

    #[test]
    fn test_queued_samples_then_ramp() {
        let device = SimDevice::new(4).with_samples(2, [0x1234, -1]);
        let mut session = open(&device);
        session.set_config(StatusCode::CurrentChannel, 2).unwrap();
        session.set_config(StatusCode::ChannelEnable, 1).unwrap();

        assert_eq!(session.read().unwrap(), 0x1234);
        assert_eq!(session.read().unwrap(), 0xffff);
        assert_eq!(session.read().unwrap(), 0x2000);
        assert_eq!(session.read().unwrap(), 0x2000 + RAMP_STEP);
    }

    #[test]
    fn test_auto_increment_wraps() {
        let device = SimDevice::new(2)
            .with_samples(0, [0x10, 0x11])
            .with_samples(1, [0x20]);
        let mut session = open(&device);
        for ch in 0..2 {
            session.set_config(StatusCode::CurrentChannel, ch).unwrap();
            session.set_config(StatusCode::ChannelEnable, 1).unwrap();
        }
        session.set_config(StatusCode::CurrentChannel, 0).unwrap();
        session
            .set_config(StatusCode::IoMode, IoMode::AutoIncrement.raw())
            .unwrap();

        assert_eq!(session.read().unwrap(), 0x10);
        assert_eq!(session.read().unwrap(), 0x20);
        assert_eq!(session.read().unwrap(), 0x11);
    }

    #[test]
    fn test_register_validation() {
        let device = SimDevice::new(8);
        let mut session = open(&device);

        let err = session.set_config(StatusCode::CurrentChannel, 8).unwrap_err();
        assert_eq!(err.code, mdis_sys::ERR_LL_ILL_CHAN as u32);

        let err = session.set_config(StatusCode::ChannelGain, 4).unwrap_err();
        assert_eq!(err.code, mdis_sys::ERR_LL_ILL_PARAM as u32);

        let err = session.set_config(StatusCode::ChannelCount, 1).unwrap_err();
        assert_eq!(err.code, mdis_sys::ERR_LL_UNK_CODE as u32);

        assert_eq!(session.get_config(StatusCode::ChannelCount).unwrap(), 8);
    }

    #[test]
    fn test_status_registers() {
        let device = SimDevice::from_settings(&SimulatorSettings {
            channels: 16,
            single_ended: true,
        })
        .with_external_pin(true)
        .with_samples(0, [0x0003]);
        let mut session = open(&device);

        assert_eq!(session.get_config(StatusCode::SingleEnded).unwrap(), 1);
        assert_eq!(session.get_config(StatusCode::ExternalPin).unwrap(), 1);
        assert_eq!(session.get_config(StatusCode::EnabledChannels).unwrap(), 0);
        assert_eq!(session.get_config(StatusCode::RawData).unwrap(), 0x000c);

        session.set_config(StatusCode::ChannelEnable, 1).unwrap();
        assert_eq!(session.get_config(StatusCode::EnabledChannels).unwrap(), 1);
    }

    #[test]
    fn test_call_log_keeps_most_recent_calls() {
        let device = SimDevice::new(2).with_call_log_limit(3);
        let mut session = open(&device);
        session.set_config(StatusCode::ChannelEnable, 1).unwrap();
        for _ in 0..10 {
            session.read().unwrap();
        }
        session.close().unwrap();

        assert_eq!(
            device.calls(),
            vec![SessionCall::Read, SessionCall::Read, SessionCall::Close]
        );
    }

    #[test]
    fn test_call_log_can_be_disabled() {
        let device = SimDevice::new(2).with_call_log_limit(0);
        let mut session = open(&device);
        session.set_config(StatusCode::ChannelEnable, 1).unwrap();
        session.read().unwrap();
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_fail_after_lets_calls_through() {
        let error = SessionError::new(0x0a0b, "read error");
        let device = SimDevice::new(1).fail_after(SimOp::Read, 2, error.clone());
        let mut session = open(&device);
        session.set_config(StatusCode::ChannelEnable, 1).unwrap();

        assert!(session.read().is_ok());
        assert!(session.read().is_ok());
        assert_eq!(session.read().unwrap_err(), error);
        assert_eq!(session.read().unwrap_err(), error);
    }

    #[test]
    fn test_second_open_is_rejected() {
        let device = SimDevice::new(1);
        let _first = open(&device);
        assert!(device.session("sim0").is_err());
    }
}
