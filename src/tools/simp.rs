//! `m36_simp`: enable every channel and read each one once.
//!
//! All channels are switched to bipolar mode, internal trigger and gain ×1,
//! then read in auto-increment mode and printed as a table.

use std::ffi::OsString;
use std::io::{self, Write};

use clap::Parser;
use tracing::{debug, warn};

use super::{clap_message, report_usage, with_session, Outcome};
use crate::channel::{Gain, Polarity, TriggerSource};
use crate::configurator::Configurator;
use crate::convert::sweep_row;
use crate::error::{M36Error, Result};
use crate::session::SessionOpener;

/// Usage text printed for `-?` and after every command line error.
pub const USAGE: &str = "\
Syntax: m36_simp <device> <chan>
Function: M36 example for reading all channels
Options:
    device       device name

";

#[derive(Parser, Debug)]
#[command(name = "m36_simp", disable_help_flag = true, disable_version_flag = true)]
struct SimpArgs {
    /// Device name
    device: Option<String>,

    /// Accepted for compatibility and ignored
    #[arg(hide = true)]
    extra: Vec<String>,

    /// Print usage
    #[arg(short = '?')]
    help: bool,
}

/// Parse an `m36_simp` command line and return the device name.
pub fn parse_args<I, T>(args: I) -> Result<String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = SimpArgs::try_parse_from(args).map_err(|e| M36Error::Usage(clap_message(&e)))?;
    if args.help {
        return Err(M36Error::HelpRequested);
    }
    if !args.extra.is_empty() {
        debug!(ignored = ?args.extra, "Ignoring arguments after the device name");
    }
    args.device
        .ok_or_else(|| M36Error::Usage("no device given".to_string()))
}

/// Enable all channels on `device`, then read and print each one.
pub fn run<W: Write>(device: &str, opener: &dyn SessionOpener, out: &mut W) -> io::Result<Outcome> {
    with_session(opener, device, out, |session, out| {
        let mut configurator = Configurator::new(session);
        configurator.set_polarity(Polarity::Bipolar)?;
        configurator.set_trigger(TriggerSource::Internal)?;
        let channels = configurator.enable_all(Gain::X1)?;
        let adapter = match configurator.input_adapter() {
            Ok(adapter) => Some(adapter),
            Err(e) => {
                warn!(error = %e, "Input adapter query failed");
                None
            }
        };

        writeln!(out, "measuring mode : {}", Polarity::Bipolar)?;
        writeln!(out, "trigger mode   : {}", TriggerSource::Internal)?;
        writeln!(out, "gain factor    : {}x", Gain::X1.factor())?;
        if let Some(adapter) = adapter {
            writeln!(out, "input adapter  : {}", adapter)?;
        }
        writeln!(out, "\n--chan------value----voltage-----")?;

        for channel in 0..channels {
            let raw = session.read()?;
            writeln!(out, "{}", sweep_row(channel, raw))?;
        }
        Ok(())
    })
}

/// Parse the command line and run; usage errors print the usage text.
pub fn main_with<I, T, W>(args: I, opener: &dyn SessionOpener, out: &mut W) -> io::Result<Outcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    match parse_args(args) {
        Ok(device) => run(&device, opener, out),
        Err(e) => report_usage(out, &e, USAGE),
    }
}
