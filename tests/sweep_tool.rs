//! End-to-end tests for `m36_simp` against the simulator.

use m36_daq::config::SimulatorSettings;
use m36_daq::error::SessionError;
use m36_daq::session::{DeviceOpener, IoMode, SessionCall, SessionOpener, SimDevice, SimOp, StatusCode};
use m36_daq::tools::simp;
use m36_daq::tools::Outcome;

fn run_simp(opener: &dyn SessionOpener, args: &[&str]) -> (Outcome, String) {
    let mut out = Vec::new();
    let argv = std::iter::once("m36_simp").chain(args.iter().copied());
    let outcome = simp::main_with(argv, opener, &mut out).unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

#[test]
fn test_sweep_enables_channels_in_order() {
    let device = SimDevice::new(4);

    let (outcome, _) = run_simp(&device, &["sim0"]);
    assert_eq!(outcome, Outcome::Completed);

    let calls = device.calls();
    let setup: Vec<_> = calls
        .iter()
        .skip_while(|call| **call != SessionCall::Get(StatusCode::ChannelCount))
        .skip(1)
        .take(4 * 3 + 2)
        .cloned()
        .collect();

    let mut expected = Vec::new();
    for channel in 0..4 {
        expected.push(SessionCall::Set(StatusCode::CurrentChannel, channel));
        expected.push(SessionCall::Set(StatusCode::ChannelEnable, 1));
        expected.push(SessionCall::Set(StatusCode::ChannelGain, 0));
    }
    expected.push(SessionCall::Set(StatusCode::CurrentChannel, 0));
    expected.push(SessionCall::Set(StatusCode::IoMode, IoMode::AutoIncrement.raw()));
    assert_eq!(setup, expected);

    assert_eq!(
        &calls[..3],
        &[
            SessionCall::Open("sim0".to_string()),
            SessionCall::Set(StatusCode::Bipolar, 1),
            SessionCall::Set(StatusCode::ExternalTrigger, 0),
        ]
    );
    assert_eq!(calls.iter().filter(|c| **c == SessionCall::Read).count(), 4);
    assert_eq!(calls.last(), Some(&SessionCall::Close));
    assert!((0..4).all(|ch| device.is_enabled(ch)));
}

#[test]
fn test_sweep_table() {
    let device = SimDevice::new(4).with_samples(2, [-0x4000]);

    let (outcome, output) = run_simp(&device, &["sim0"]);

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(
        output,
        "measuring mode : bipolar\n\
         trigger mode   : intern\n\
         gain factor    : 1x\n\
         input adapter  : differential\n\
         \n\
         --chan------value----voltage-----\n     \
         0     0x0000  =   0.000 Volt\n     \
         1     0x1000  =   1.250 Volt\n     \
         2     0xc000  =  -5.000 Volt\n     \
         3     0x3000  =   3.750 Volt\n"
    );
}

#[test]
fn test_simulator_settings_select_adapter_and_channels() {
    let opener = DeviceOpener::new(SimulatorSettings {
        channels: 16,
        single_ended: true,
    });

    let (outcome, output) = run_simp(&opener, &["sim_m36"]);

    assert_eq!(outcome, Outcome::Completed);
    assert!(output.contains("input adapter  : single-ended\n"));
    assert_eq!(output.lines().filter(|l| l.ends_with(" Volt")).count(), 16);
}

#[test]
fn test_failed_adapter_query_does_not_stop_sweep() {
    let device = SimDevice::new(2).fail_on(
        SimOp::Get(StatusCode::SingleEnded),
        SessionError::new(0x0a02, "unknown status code"),
    );

    let (outcome, output) = run_simp(&device, &["sim0"]);

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(
        output,
        "measuring mode : bipolar\n\
         trigger mode   : intern\n\
         gain factor    : 1x\n\
         \n\
         --chan------value----voltage-----\n     \
         0     0x0000  =   0.000 Volt\n     \
         1     0x1000  =   1.250 Volt\n"
    );
}

#[test]
fn test_sweep_queries_only_channel_count_and_adapter() {
    let device = SimDevice::new(2);

    run_simp(&device, &["sim0"]);

    let gets: Vec<_> = device
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            SessionCall::Get(code) => Some(code),
            _ => None,
        })
        .collect();
    assert_eq!(gets, vec![StatusCode::ChannelCount, StatusCode::SingleEnded]);
}

#[test]
fn test_arguments_after_device_are_ignored() {
    let device = SimDevice::new(2);

    let (outcome, output) = run_simp(&device, &["sim0", "3"]);

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(output.lines().filter(|l| l.ends_with(" Volt")).count(), 2);
}

#[test]
fn test_sweep_failure_closes_and_exits_0() {
    let device = SimDevice::new(8).fail_after(
        SimOp::Set(StatusCode::ChannelEnable),
        3,
        SessionError::new(0x0a04, "illegal channel"),
    );

    let (outcome, output) = run_simp(&device, &["sim0"]);

    assert_eq!(outcome, Outcome::DeviceFailure);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(output, "*** can't setstat M36_CH_ENABLE: illegal channel\n");
    assert!(device.is_enabled(2));
    assert!(!device.is_enabled(3));
    assert_eq!(device.calls().last(), Some(&SessionCall::Close));
}

#[cfg(not(feature = "mdis_hardware"))]
#[test]
fn test_hardware_device_without_sdk_fails_to_open() {
    let (outcome, output) = run_simp(&DeviceOpener::default(), &["m36_1"]);

    assert_eq!(outcome, Outcome::OpenFailed);
    assert!(output.starts_with("*** can't open: "));
}

#[test]
fn test_usage() {
    let device = SimDevice::new(8);

    let (outcome, output) = run_simp(&device, &[]);
    assert_eq!(outcome.exit_code(), 1);
    assert!(output.contains("Syntax: m36_simp <device>"));

    let (outcome, output) = run_simp(&device, &["-?"]);
    assert_eq!(outcome, Outcome::Usage);
    assert!(output.starts_with("Syntax: m36_simp"));
    assert!(device.calls().is_empty());
}
