//! `m36_read`: configure and read one M36 input channel.
//!
//! ```text
//! m36_read [<opts>] <device> [<opts>]
//! ```
//!
//! The channel is configured once (polarity, channel, enable, gain, trigger),
//! the settings are printed, then one sample is read and printed. With `-l`
//! reading repeats until a key is pressed.

use std::ffi::OsString;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use clap::Parser;

use super::{clap_message, report_usage, with_session, Outcome};
use crate::channel::{ChannelConfig, DisplayMode, Gain, Polarity, TriggerSource};
use crate::configurator::Configurator;
use crate::convert::Reading;
use crate::error::{M36Error, Result};
use crate::keypress::StopSignal;
use crate::session::SessionOpener;

/// Usage text printed for `-?` and after every command line error.
pub const USAGE: &str = "\
Usage: m36_read [<opts>] <device> [<opts>]
Function: Configure and read M36 channel
Options:
    device       device name                 [none]
    -c=<chan>    channel number (0..7/15)    [0]
    -g=<gain>    gain factor                 [x1]
                  0 = x1
                  1 = x2
                  2 = x4
                  3 = x8
                  4 = x16 (on-board jumper must be set !)
    -m=<mode>    measuring mode              [unipolar]
                  0=unipolar
                  1=bipolar
    -t=<trig>    trigger mode                [intern]
                  0 = internal trigger
                  1 = external trigger
    -d=<mode>    display mode                [raw hex]
                  0 = raw hex value
                  1 = hex and volt
                  2 = hex and ampere (only for gain factor x8)
    -l           loop mode                   [no]
";

#[derive(Parser, Debug)]
#[command(name = "m36_read", disable_help_flag = true, disable_version_flag = true)]
struct ReadArgs {
    /// Device name
    device: Option<String>,

    /// Channel number
    #[arg(
        short = 'c',
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(i32::MAX))
    )]
    channel: u32,

    /// Gain code (0..=4)
    #[arg(short = 'g', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=4))]
    gain: u8,

    /// Measuring mode (0 = unipolar, 1 = bipolar)
    #[arg(short = 'm', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    mode: u8,

    /// Trigger mode (0 = internal, 1 = external)
    #[arg(short = 't', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    trigger: u8,

    /// Display mode (0 = raw, 1 = volt, 2 = milliampere)
    #[arg(short = 'd', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    display: u8,

    /// Loop until a key is pressed
    #[arg(short = 'l')]
    loop_mode: bool,

    /// Print usage
    #[arg(short = '?')]
    help: bool,
}

/// Parsed `m36_read` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Device name
    pub device: String,
    /// Channel parameters to apply
    pub config: ChannelConfig,
    /// How readings are printed
    pub display: DisplayMode,
    /// Keep reading until a key is pressed
    pub loop_mode: bool,
}

/// Parse an `m36_read` command line (including the program name).
///
/// # Errors
///
/// [`M36Error::HelpRequested`] for `-?`, [`M36Error::Usage`] for a missing
/// device or a malformed option, [`M36Error::OptionConflict`] for `-d=2`
/// without `-g=3`.
pub fn parse_args<I, T>(args: I) -> Result<ReadOptions>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = ReadArgs::try_parse_from(args).map_err(|e| M36Error::Usage(clap_message(&e)))?;

    if args.help {
        return Err(M36Error::HelpRequested);
    }
    let device = args
        .device
        .ok_or_else(|| M36Error::Usage("no device given".to_string()))?;

    // ranges are enforced by the value parsers
    let out_of_range =
        |option: char, value: u8| M36Error::Usage(format!("option -{}={} out of range", option, value));
    let gain = Gain::from_code(args.gain).ok_or_else(|| out_of_range('g', args.gain))?;
    let polarity = Polarity::from_code(args.mode).ok_or_else(|| out_of_range('m', args.mode))?;
    let trigger =
        TriggerSource::from_code(args.trigger).ok_or_else(|| out_of_range('t', args.trigger))?;
    let display =
        DisplayMode::from_code(args.display).ok_or_else(|| out_of_range('d', args.display))?;

    let config = ChannelConfig::new(args.channel)
        .with_gain(gain)
        .with_polarity(polarity)
        .with_trigger(trigger);
    config.check_display(display)?;

    Ok(ReadOptions {
        device,
        config,
        display,
        loop_mode: args.loop_mode,
    })
}

/// Configure the channel, print its settings and read.
///
/// `delay` is slept after every read, before the stop signal is polled.
pub fn run<W: Write>(
    options: &ReadOptions,
    opener: &dyn SessionOpener,
    out: &mut W,
    stop: &mut dyn StopSignal,
    delay: Duration,
) -> io::Result<Outcome> {
    with_session(opener, &options.device, out, |session, out| {
        let config = &options.config;
        Configurator::new(session).apply(config)?;

        writeln!(out, "channel number      : {}", config.channel)?;
        writeln!(out, "gain factor         : {}", config.gain)?;
        writeln!(out, "measuring mode      : {}", config.polarity)?;
        writeln!(out, "trigger mode        : {}\n", config.trigger)?;

        loop {
            let raw = session.read()?;
            writeln!(out, "{}", Reading::new(raw, config.polarity, options.display))?;

            if !delay.is_zero() {
                thread::sleep(delay);
            }
            if !options.loop_mode || stop.should_stop() {
                break;
            }
        }
        Ok(())
    })
}

/// Parse the command line and run; usage errors print the usage text.
pub fn main_with<I, T, W>(
    args: I,
    opener: &dyn SessionOpener,
    out: &mut W,
    stop: &mut dyn StopSignal,
    delay: Duration,
) -> io::Result<Outcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    match parse_args(args) {
        Ok(options) => run(&options, opener, out, stop, delay),
        Err(e) => report_usage(out, &e, USAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = parse_args(["m36_read", "m36_1"]).unwrap();
        assert_eq!(options.device, "m36_1");
        assert_eq!(options.config, ChannelConfig::new(0));
        assert_eq!(options.display, DisplayMode::Raw);
        assert!(!options.loop_mode);
    }

    #[test]
    fn test_mdis_style_options_around_device() {
        let options =
            parse_args(["m36_read", "-c=5", "-g=3", "m36_1", "-m=1", "-t=1", "-d=2", "-l"]).unwrap();
        assert_eq!(options.device, "m36_1");
        assert_eq!(options.config.channel, 5);
        assert_eq!(options.config.gain, Gain::X8);
        assert_eq!(options.config.polarity, Polarity::Bipolar);
        assert_eq!(options.config.trigger, TriggerSource::External);
        assert_eq!(options.display, DisplayMode::Current);
        assert!(options.loop_mode);
    }

    #[test]
    fn test_current_display_needs_x8_gain() {
        for gain in ["0", "1", "2", "4"] {
            let gain_opt = format!("-g={}", gain);
            let err = parse_args(["m36_read", "m36_1", "-d=2", gain_opt.as_str()]).unwrap_err();
            assert!(matches!(err, M36Error::OptionConflict { .. }), "gain {}", gain);
        }
    }

    #[test]
    fn test_usage_errors() {
        assert!(matches!(parse_args(["m36_read"]), Err(M36Error::Usage(_))));
        assert!(matches!(parse_args(["m36_read", "-?"]), Err(M36Error::HelpRequested)));
        assert!(matches!(parse_args(["m36_read", "m36_1", "-g=5"]), Err(M36Error::Usage(_))));
        assert!(matches!(parse_args(["m36_read", "m36_1", "-d=3"]), Err(M36Error::Usage(_))));
        assert!(matches!(parse_args(["m36_read", "m36_1", "-x"]), Err(M36Error::Usage(_))));
        assert!(matches!(parse_args(["m36_read", "m36_1", "-c=-1"]), Err(M36Error::Usage(_))));
        assert!(matches!(
            parse_args(["m36_read", "m36_1", "-c=4294967295"]),
            Err(M36Error::Usage(_))
        ));
        assert!(matches!(
            parse_args(["m36_read", "m36_1", "-c=2147483648"]),
            Err(M36Error::Usage(_))
        ));
        assert_eq!(parse_args(["m36_read", "m36_1", "-c=2147483647"]).unwrap().config.channel, 2147483647);
    }
}
