//! Raw code to physical unit conversion.
//!
//! The M36 delivers 16-bit codes. Unipolar codes are unsigned, bipolar codes
//! are two's complement. The scale factors are the fixed calibration of the
//! module: full scale is 10 V unipolar / ±10 V bipolar, and 20 mA / ±20 mA with
//! the current input adapter at gain ×8.

use std::fmt;

use crate::channel::{DisplayMode, Polarity};

/// Divisor for all conversions (`0xffff`).
pub const FULL_SCALE: f64 = 65535.0;

/// Physical quantity a code is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Volts
    Voltage,
    /// Milliamps
    Current,
}

impl Quantity {
    /// Unit label used in printed readings.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Voltage => "V",
            Self::Current => "mA",
        }
    }

    /// Quantity shown for a display mode, `None` for raw display.
    pub fn for_display(display: DisplayMode) -> Option<Self> {
        match display {
            DisplayMode::Raw => None,
            DisplayMode::Voltage => Some(Self::Voltage),
            DisplayMode::Current => Some(Self::Current),
        }
    }
}

fn span(polarity: Polarity, quantity: Quantity) -> f64 {
    match (polarity, quantity) {
        (Polarity::Unipolar, Quantity::Voltage) => 10.0,
        (Polarity::Bipolar, Quantity::Voltage) => 20.0,
        (Polarity::Unipolar, Quantity::Current) => 20.0,
        (Polarity::Bipolar, Quantity::Current) => 40.0,
    }
}

/// Convert a raw code to volts or milliamps.
///
/// Only the low 16 bits of `raw` are used; they are read as unsigned for
/// unipolar and as signed for bipolar inputs.
pub fn to_physical(raw: i32, polarity: Polarity, quantity: Quantity) -> f64 {
    let code = match polarity {
        Polarity::Unipolar => f64::from(raw as u16),
        Polarity::Bipolar => f64::from(raw as i16),
    };
    code * span(polarity, quantity) / FULL_SCALE
}

/// Convert a raw code for a display mode; `None` for raw display.
pub fn convert(raw: i32, polarity: Polarity, display: DisplayMode) -> Option<f64> {
    Quantity::for_display(display).map(|quantity| to_physical(raw, polarity, quantity))
}

/// One sample as printed by `m36_read`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Value returned by the read call
    pub raw: i32,
    /// Polarity the channel was configured with
    pub polarity: Polarity,
    /// Display mode
    pub display: DisplayMode,
}

impl Reading {
    /// Create a reading.
    pub fn new(raw: i32, polarity: Polarity, display: DisplayMode) -> Self {
        Self {
            raw,
            polarity,
            display,
        }
    }

    /// Converted value, `None` for raw display.
    pub fn value(&self) -> Option<f64> {
        convert(self.raw, self.polarity, self.display)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Quantity::for_display(self.display) {
            None => write!(f, "read: 0x{:04x} ({})", self.raw, self.polarity),
            Some(quantity) => write!(
                f,
                "read: 0x{:04x} = {:7.4} {} ({})",
                self.raw,
                to_physical(self.raw, self.polarity, quantity),
                quantity.unit(),
                self.polarity
            ),
        }
    }
}

/// Table row printed by `m36_simp` for a bipolar reading.
pub fn sweep_row(channel: u32, raw: i32) -> String {
    format!(
        "    {:2}     0x{:04x}  =  {:6.3} Volt",
        channel,
        raw,
        to_physical(raw, Polarity::Bipolar, Quantity::Voltage)
    )
}
