//! `m36_read`: configure and read one M36 input channel.
//!
//! ```bash
//! m36_read m36_1 -c=2 -g=3 -d=2 -l
//! ```
//!
//! Device names starting with `sim` use the built-in simulator.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use m36_daq::config::Settings;
use m36_daq::keypress::StdinKeypress;
use m36_daq::logging;
use m36_daq::session::DeviceOpener;
use m36_daq::tools::read;

fn main() -> Result<ExitCode> {
    let settings = Settings::load().context("failed to load m36 settings")?;
    settings.validate().map_err(|e| anyhow!(e))?;
    logging::init_from_settings(&settings).map_err(|e| anyhow!(e))?;

    let opener = DeviceOpener::new(settings.simulator.clone());
    let mut stdout = io::stdout().lock();
    let outcome = read::main_with(
        std::env::args_os(),
        &opener,
        &mut stdout,
        &mut StdinKeypress::new(),
        settings.loop_delay(),
    )?;
    stdout.flush()?;

    Ok(ExitCode::from(outcome.exit_code()))
}
