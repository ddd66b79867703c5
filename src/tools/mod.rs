//! Command-line tools.
//!
//! - [`read`] - `m36_read`: configure one channel and read it once or in a loop
//! - [`simp`] - `m36_simp`: enable all channels and read each one once
//!
//! Both tools print device errors as `*** can't <operation>: <reason>`, close
//! the device and still finish with exit code 0. Only usage errors and a failed
//! open end with exit code 1.

pub mod read;
pub mod simp;

use std::io::{self, Write};

use crate::error::{M36Error, Result};
use crate::session::{Session, SessionOpener};

/// How a tool run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All steps succeeded
    Completed,
    /// A configuration or read step failed after the device was opened
    DeviceFailure,
    /// The device could not be opened
    OpenFailed,
    /// Bad command line or `-?`
    Usage,
}

impl Outcome {
    /// Process exit code.
    ///
    /// A device failure after a successful open still exits with 0.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Completed | Self::DeviceFailure => 0,
            Self::OpenFailed | Self::Usage => 1,
        }
    }
}

/// Text of a clap error without the `error: ` prefix and the usage hints.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

/// Print a parse failure followed by the usage text.
fn report_usage<W: Write>(out: &mut W, err: &M36Error, usage: &str) -> io::Result<Outcome> {
    if !matches!(err, M36Error::HelpRequested) {
        writeln!(out, "\n*** {}\n", err)?;
    }
    write!(out, "{}", usage)?;
    Ok(Outcome::Usage)
}

/// Open `device`, run `body`, and close the device on every path.
///
/// Errors from `body` are printed and end the run; close errors are printed
/// too. Only an output failure is returned as `Err`.
fn with_session<W, F>(opener: &dyn SessionOpener, device: &str, out: &mut W, body: F) -> io::Result<Outcome>
where
    W: Write,
    F: FnOnce(&mut Session, &mut W) -> Result<()>,
{
    let mut session = match Session::open(opener, device) {
        Ok(session) => session,
        Err(e) => {
            writeln!(out, "*** {}", e)?;
            return Ok(Outcome::OpenFailed);
        }
    };

    let outcome = match body(&mut session, out) {
        Ok(()) => Outcome::Completed,
        Err(M36Error::Output(e)) => return Err(e),
        Err(e) => {
            writeln!(out, "*** {}", e)?;
            Outcome::DeviceFailure
        }
    };

    if let Err(e) = session.close() {
        writeln!(out, "*** {}", e)?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Completed.exit_code(), 0);
        assert_eq!(Outcome::DeviceFailure.exit_code(), 0);
        assert_eq!(Outcome::OpenFailed.exit_code(), 1);
        assert_eq!(Outcome::Usage.exit_code(), 1);
    }
}
