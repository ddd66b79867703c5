//! # M36 Analog Input Library
//!
//! Configuration and readout of the MEN M36 analog-input M-Module through the
//! MDIS driver interface, plus the `m36_read` and `m36_simp` tools built on it.
//!
//! ## Crate Structure
//!
//! - **`channel`**: Acquisition parameters picked by the user: gain, polarity,
//!   trigger source, display mode, bundled as `ChannelConfig`.
//! - **`config`**: Tool settings loaded from `m36.toml` and `M36_*` environment
//!   variables. See `config::Settings`.
//! - **`configurator`**: The fixed setstat sequences that configure one channel
//!   or enable all of them, and the module status query.
//! - **`convert`**: Raw 16-bit sample to volts or milliamps, and the output
//!   line formats.
//! - **`error`**: `SessionError` for single device calls and the crate-wide
//!   `M36Error`.
//! - **`keypress`**: The `StopSignal` polled between reads in loop mode.
//! - **`logging`**: `tracing` subscriber setup.
//! - **`session`**: The `DeviceSession` capability with its MDIS hardware and
//!   simulator implementations, and the scoped `Session` that always closes.
//! - **`tools`**: Command line front ends shared by the binaries and the tests.

pub mod channel;
pub mod config;
pub mod configurator;
pub mod convert;
pub mod error;
pub mod keypress;
pub mod logging;
pub mod session;
pub mod tools;

pub use channel::{ChannelConfig, DisplayMode, Gain, Polarity, TriggerSource};
pub use config::Settings;
pub use configurator::{Configurator, DeviceStatus, InputAdapter};
pub use convert::{convert, to_physical, Reading};
pub use error::{M36Error, Result, SessionError};
pub use session::{DeviceOpener, DeviceSession, Session, SessionOpener, StatusCode};
