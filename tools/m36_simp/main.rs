//! `m36_simp`: enable all M36 channels and read each one once.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use m36_daq::config::Settings;
use m36_daq::logging;
use m36_daq::session::DeviceOpener;
use m36_daq::tools::simp;

fn main() -> Result<ExitCode> {
    let settings = Settings::load().context("failed to load m36 settings")?;
    settings.validate().map_err(|e| anyhow!(e))?;
    logging::init_from_settings(&settings).map_err(|e| anyhow!(e))?;

    let opener = DeviceOpener::new(settings.simulator.clone());
    let mut stdout = io::stdout().lock();
    let outcome = simp::main_with(std::env::args_os(), &opener, &mut stdout)?;
    stdout.flush()?;

    Ok(ExitCode::from(outcome.exit_code()))
}
