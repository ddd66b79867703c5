//! Channel acquisition parameters.
//!
//! These are the values a user picks on the command line. Each maps onto one
//! M36 setstat value; [`ChannelConfig`] bundles them for a single channel.

use std::fmt;

use crate::error::{M36Error, Result};

/// Analog amplification of an input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    /// ×1
    #[default]
    X1,
    /// ×2
    X2,
    /// ×4
    X4,
    /// ×8, the only gain that allows current display
    X8,
    /// ×16, selected by an on-board jumper
    X16,
}

impl Gain {
    /// All gains in code order.
    pub const ALL: [Gain; 5] = [Gain::X1, Gain::X2, Gain::X4, Gain::X8, Gain::X16];

    /// Convert from the gain code used on the command line (0..=4).
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Gain code (0..=4).
    pub fn code(self) -> u8 {
        match self {
            Self::X1 => 0,
            Self::X2 => 1,
            Self::X4 => 2,
            Self::X8 => 3,
            Self::X16 => 4,
        }
    }

    /// Amplification factor, `1 << code`.
    pub fn factor(self) -> u32 {
        1 << self.code()
    }

    /// ×16 is set by the on-board jumper; software can neither write nor verify it.
    pub fn is_jumper_only(self) -> bool {
        self == Self::X16
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.factor())
    }
}

/// Input range interpretation, applied to all channels at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// 0..+10 V, raw code unsigned
    #[default]
    Unipolar,
    /// -10..+10 V, raw code signed
    Bipolar,
}

impl Polarity {
    /// Convert from the `-m=` option value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unipolar),
            1 => Some(Self::Bipolar),
            _ => None,
        }
    }

    /// Value written to `M36_BIPOLAR`.
    pub fn code(self) -> i32 {
        match self {
            Self::Unipolar => 0,
            Self::Bipolar => 1,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unipolar => write!(f, "unipolar"),
            Self::Bipolar => write!(f, "bipolar"),
        }
    }
}

/// Sampling trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerSource {
    /// Conversion started by the read call
    #[default]
    Internal,
    /// Conversion started by the external trigger input
    External,
}

impl TriggerSource {
    /// Convert from the `-t=` option value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Internal),
            1 => Some(Self::External),
            _ => None,
        }
    }

    /// Value written to `M36_EXT_TRIG`.
    pub fn code(self) -> i32 {
        match self {
            Self::Internal => 0,
            Self::External => 1,
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "intern"),
            Self::External => write!(f, "extern"),
        }
    }
}

/// How a reading is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Raw hex code only
    #[default]
    Raw,
    /// Hex code and volts
    Voltage,
    /// Hex code and milliamps (current input adapter, gain ×8)
    Current,
}

impl DisplayMode {
    /// Convert from the `-d=` option value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Raw),
            1 => Some(Self::Voltage),
            2 => Some(Self::Current),
            _ => None,
        }
    }

    /// Option value (0..=2).
    pub fn code(self) -> u8 {
        match self {
            Self::Raw => 0,
            Self::Voltage => 1,
            Self::Current => 2,
        }
    }
}

/// Acquisition parameters of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Channel index
    pub channel: u32,
    /// Amplification
    pub gain: Gain,
    /// Input range interpretation
    pub polarity: Polarity,
    /// Sampling trigger
    pub trigger: TriggerSource,
    /// Whether the channel takes part in conversions
    pub enabled: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            gain: Gain::X1,
            polarity: Polarity::Unipolar,
            trigger: TriggerSource::Internal,
            enabled: true,
        }
    }
}

impl ChannelConfig {
    /// Create an enabled configuration for `channel` with default parameters.
    pub fn new(channel: u32) -> Self {
        Self {
            channel,
            ..Default::default()
        }
    }

    /// Set the gain.
    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    /// Set the polarity.
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Set the trigger source.
    pub fn with_trigger(mut self, trigger: TriggerSource) -> Self {
        self.trigger = trigger;
        self
    }

    /// Check that `display` can be used with this configuration.
    ///
    /// Current display is calibrated for the ×8 gain only.
    pub fn check_display(&self, display: DisplayMode) -> Result<()> {
        if display == DisplayMode::Current && self.gain != Gain::X8 {
            return Err(M36Error::OptionConflict {
                option: format!("-d={}", display.code()),
                requires: format!("-g={}", Gain::X8.code()),
            });
        }
        Ok(())
    }
}
