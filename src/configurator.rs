//! Channel configuration sequences.
//!
//! Each sequence is a fixed order of setstat calls. The first failing call
//! ends the sequence and its error is returned unchanged; nothing is retried or
//! rolled back.

use std::fmt;

use tracing::debug;

use crate::channel::{ChannelConfig, Gain, Polarity, TriggerSource};
use crate::error::{M36Error, Result};
use crate::session::{IoMode, Session, StatusCode};

/// Input adapter fitted to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAdapter {
    /// 16 single-ended inputs
    SingleEnded,
    /// 8 differential inputs
    Differential,
}

impl fmt::Display for InputAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleEnded => write!(f, "single-ended"),
            Self::Differential => write!(f, "differential"),
        }
    }
}

/// Read-only module status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Number of channels
    pub channels: u32,
    /// Number of enabled channels
    pub enabled_channels: u32,
    /// Fitted input adapter
    pub input_adapter: InputAdapter,
    /// Level of the external binary input
    pub external_pin: bool,
}

/// Applies configuration sequences to an open session.
pub struct Configurator<'a> {
    session: &'a mut Session,
}

impl<'a> Configurator<'a> {
    /// Configure through `session`.
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    /// Set the measuring mode of all channels.
    pub fn set_polarity(&mut self, polarity: Polarity) -> Result<()> {
        self.session.set(StatusCode::Bipolar, polarity.code())
    }

    /// Set the sampling trigger.
    pub fn set_trigger(&mut self, trigger: TriggerSource) -> Result<()> {
        self.session.set(StatusCode::ExternalTrigger, trigger.code())
    }

    /// Make `channel` the target of following calls.
    ///
    /// Channels above `i32::MAX` cannot be addressed and are rejected before
    /// anything is written.
    pub fn select_channel(&mut self, channel: u32) -> Result<()> {
        let channel = i32::try_from(channel)
            .map_err(|_| M36Error::Usage(format!("channel {} out of range", channel)))?;
        self.session.set(StatusCode::CurrentChannel, channel)
    }

    /// Write the gain of the current channel.
    ///
    /// ×16 is set by jumper and is never written; the call is a no-op for it.
    pub fn set_gain(&mut self, gain: Gain) -> Result<()> {
        if gain.is_jumper_only() {
            debug!(gain = %gain, "Gain set by on-board jumper, not written");
            return Ok(());
        }
        self.session
            .set(StatusCode::ChannelGain, i32::from(gain.code()))
    }

    /// Apply a single channel configuration.
    ///
    /// Order: polarity (all channels), select channel, enable, gain, trigger.
    pub fn apply(&mut self, config: &ChannelConfig) -> Result<()> {
        self.set_polarity(config.polarity)?;
        self.select_channel(config.channel)?;
        self.session
            .set(StatusCode::ChannelEnable, i32::from(config.enabled))?;
        self.set_gain(config.gain)?;
        self.set_trigger(config.trigger)?;

        debug!(
            device = %self.session.device(),
            channel = config.channel,
            gain = %config.gain,
            polarity = %config.polarity,
            trigger = %config.trigger,
            "Channel configured"
        );
        Ok(())
    }

    /// Enable every channel with `gain`, then select channel 0 and switch to
    /// auto-increment reads.
    ///
    /// Returns the number of channels.
    pub fn enable_all(&mut self, gain: Gain) -> Result<u32> {
        let channels = self.session.get(StatusCode::ChannelCount)?.max(0) as u32;

        for channel in 0..channels {
            self.select_channel(channel)?;
            self.session.set(StatusCode::ChannelEnable, 1)?;
            self.set_gain(gain)?;
        }

        self.select_channel(0)?;
        self.session
            .set(StatusCode::IoMode, IoMode::AutoIncrement.raw())?;

        debug!(device = %self.session.device(), channels, gain = %gain, "All channels enabled");
        Ok(channels)
    }

    /// Start the module's self calibration.
    pub fn calibrate(&mut self) -> Result<()> {
        self.session.set(StatusCode::Calibrate, 0)
    }

    /// Query the fitted input adapter.
    pub fn input_adapter(&mut self) -> Result<InputAdapter> {
        if self.session.get(StatusCode::SingleEnded)? != 0 {
            Ok(InputAdapter::SingleEnded)
        } else {
            Ok(InputAdapter::Differential)
        }
    }

    /// Query channel count, enabled channels, adapter type and the binary input.
    pub fn status(&mut self) -> Result<DeviceStatus> {
        let channels = self.session.get(StatusCode::ChannelCount)?.max(0) as u32;
        let enabled_channels = self.session.get(StatusCode::EnabledChannels)?.max(0) as u32;
        let input_adapter = self.input_adapter()?;
        let external_pin = self.session.get(StatusCode::ExternalPin)? != 0;

        Ok(DeviceStatus {
            channels,
            enabled_channels,
            input_adapter,
            external_pin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::session::{SessionCall, SimDevice, SimOp};

    fn sets(device: &SimDevice) -> Vec<(StatusCode, i32)> {
        device
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                SessionCall::Set(code, value) => Some((code, value)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_apply_order() {
        let device = SimDevice::new(8);
        let mut session = Session::open(&device, "sim0").unwrap();
        let config = ChannelConfig::new(5)
            .with_gain(Gain::X4)
            .with_polarity(Polarity::Bipolar)
            .with_trigger(TriggerSource::External);

        Configurator::new(&mut session).apply(&config).unwrap();

        assert_eq!(
            sets(&device),
            vec![
                (StatusCode::Bipolar, 1),
                (StatusCode::CurrentChannel, 5),
                (StatusCode::ChannelEnable, 1),
                (StatusCode::ChannelGain, 2),
                (StatusCode::ExternalTrigger, 1),
            ]
        );
        assert_eq!(device.gain_code(5), Some(2));
    }

    #[test]
    fn test_jumper_gain_is_not_written() {
        let device = SimDevice::new(8);
        let mut session = Session::open(&device, "sim0").unwrap();
        let config = ChannelConfig::new(1).with_gain(Gain::X16);

        Configurator::new(&mut session).apply(&config).unwrap();

        let codes: Vec<_> = sets(&device).into_iter().map(|(code, _)| code).collect();
        assert!(!codes.contains(&StatusCode::ChannelGain));
        assert_eq!(codes.last(), Some(&StatusCode::ExternalTrigger));
    }

    #[test]
    fn test_apply_stops_at_first_failure() {
        let device = SimDevice::new(8).fail_on(
            SimOp::Set(StatusCode::ChannelEnable),
            SessionError::new(0x0a03, "illegal parameter"),
        );
        let mut session = Session::open(&device, "sim0").unwrap();

        let err = Configurator::new(&mut session)
            .apply(&ChannelConfig::new(0))
            .unwrap_err();

        assert_eq!(err.to_string(), "can't setstat M36_CH_ENABLE: illegal parameter");
        let codes: Vec<_> = sets(&device).into_iter().map(|(code, _)| code).collect();
        assert_eq!(
            codes,
            vec![
                StatusCode::Bipolar,
                StatusCode::CurrentChannel,
                StatusCode::ChannelEnable
            ]
        );
    }

    #[test]
    fn test_status() {
        let device = SimDevice::new(8).with_external_pin(true);
        let mut session = Session::open(&device, "sim0").unwrap();
        let mut configurator = Configurator::new(&mut session);
        configurator.apply(&ChannelConfig::new(2)).unwrap();

        let status = configurator.status().unwrap();
        assert_eq!(
            status,
            DeviceStatus {
                channels: 8,
                enabled_channels: 1,
                input_adapter: InputAdapter::Differential,
                external_pin: true,
            }
        );
    }

    #[test]
    fn test_unaddressable_channel_is_not_written() {
        let device = SimDevice::new(8);
        let mut session = Session::open(&device, "sim0").unwrap();

        let err = Configurator::new(&mut session)
            .apply(&ChannelConfig::new(u32::MAX))
            .unwrap_err();

        assert!(matches!(err, M36Error::Usage(_)));
        assert!(!sets(&device)
            .iter()
            .any(|(code, _)| *code == StatusCode::CurrentChannel));
    }

    #[test]
    fn test_calibrate() {
        let device = SimDevice::new(8);
        let mut session = Session::open(&device, "sim0").unwrap();
        Configurator::new(&mut session).calibrate().unwrap();
        assert_eq!(device.calibrations(), 1);
    }
}
