//! Integration tests for the acquisition loop
//!
//! These tests drive the loop the way the panel does:
//! - Emulated connect and ticking
//! - Live reads against a scripted device
//! - Failure handling and the history policy

mod common;

use common::builders::{settings, ConfigBuilder};
use common::mock_helpers::{device_with_registers, emulated_loop, live_loop};
use modbus_ai_panel::backend::{FailureCategory, TransportError};
use modbus_ai_panel::config::FailedReadPolicy;
use modbus_ai_panel::types::{Channel, ConnectionState, ReadTrigger, ReadingSource};

#[test]
fn test_emulated_connect_and_three_ticks() {
    let mut acq = emulated_loop(1);
    acq.connection_mut().connect(&settings("", 9600)).unwrap();
    assert_eq!(acq.connection().state(), ConnectionState::Connected);
    assert_eq!(acq.connection().status().to_string(), "Connected (emulation)");

    for _ in 0..3 {
        let reading = acq.tick();
        assert!(reading.ok());
        assert!(
            (3.0..=8.5).contains(&reading.value),
            "value {} out of range",
            reading.value
        );
    }
    common::assert_float_eq(acq.emulator().time_cursor(), 0.3, 1e-9);
}

#[test]
fn test_live_connect_timeout() {
    let device = device_with_registers(&[]);
    device.fail_next_open(TransportError::Timeout("no answer from COM9".into()));
    let mut acq = live_loop(&device, &ConfigBuilder::new().build());

    let failure = acq
        .connection_mut()
        .connect(&settings("COM9", 9600))
        .unwrap_err();

    assert_eq!(failure.category, FailureCategory::Timeout);
    assert_eq!(
        failure.display_text(),
        "Error: Device not responding\n(no answer from COM9)"
    );
    assert_eq!(acq.connection().state(), ConnectionState::Disconnected);
    assert_eq!(device.open_handles(), 0);
}

#[test]
fn test_channel_three_reads_offset_two() {
    let device = device_with_registers(&[(2, 32768)]);
    let mut acq = live_loop(&device, &ConfigBuilder::new().channel(3).build());
    acq.connection_mut()
        .connect(&settings("COM9", 9600))
        .unwrap();

    let reading = acq.tick();
    assert_eq!(device.read_log(), vec![(2, 1)]);
    assert_eq!(reading.source, ReadingSource::Device);
    common::assert_float_eq(reading.value, 5.000076, 1e-6);
}

#[test]
fn test_250_emulated_ticks_keep_last_200() {
    let mut acq = emulated_loop(99);
    acq.connection_mut().connect(&settings("", 9600)).unwrap();

    let values: Vec<f64> = (0..250).map(|_| acq.tick().value).collect();

    assert_eq!(acq.history().len(), 200);
    assert_eq!(acq.history().first(), Some(values[50]));
    assert_eq!(acq.history().snapshot(), values[50..].to_vec());
}

#[test]
fn test_io_failure_on_tick_ten() {
    let device = device_with_registers(&[(0, 13107)]);
    device.fail_read_number(10, TransportError::Io("USB adapter removed".into()));
    let mut acq = live_loop(&device, &ConfigBuilder::new().build());
    acq.connection_mut()
        .connect(&settings("COM9", 9600))
        .unwrap();

    for tick in 1..=11 {
        let reading = acq.tick();
        if tick == 10 {
            let failure = reading.failure.as_ref().expect("tick 10 should fail");
            assert_eq!(failure.category, FailureCategory::IoFailure);
            assert_eq!(failure.message, "Adapter or cable problem");
            assert_eq!(reading.value, 0.0);
        } else {
            assert!(reading.ok(), "tick {} failed", tick);
            common::assert_float_eq(reading.value, 2.0, 1e-9);
        }
        assert_eq!(acq.connection().state(), ConnectionState::Connected);
    }
    assert_eq!(acq.stats().failed_reads, 1);
    assert_eq!(acq.stats().successful_reads, 10);
}

#[test]
fn test_skip_failures_leaves_gap() {
    let device = device_with_registers(&[(0, 65535)]);
    device.fail_read_number(2, TransportError::Timeout("read timed out".into()));
    let config = ConfigBuilder::new()
        .policy(FailedReadPolicy::SkipFailures)
        .build();
    let mut acq = live_loop(&device, &config);
    acq.connection_mut()
        .connect(&settings("COM9", 9600))
        .unwrap();

    for _ in 0..3 {
        acq.tick();
    }
    assert_eq!(acq.history().snapshot(), vec![10.0, 10.0]);
}

#[test]
fn test_manual_read_after_disconnect() {
    let device = device_with_registers(&[(4, 1000)]);
    let mut acq = live_loop(&device, &ConfigBuilder::new().channel(5).build());
    acq.connection_mut()
        .connect(&settings("COM9", 9600))
        .unwrap();
    acq.tick();

    acq.connection_mut().disconnect();
    let reading = acq.read_once();

    assert_eq!(reading.trigger, ReadTrigger::Manual);
    assert_eq!(reading.source, ReadingSource::NotConnected);
    assert_eq!(reading.value, 0.0);
    assert!(reading.ok());
    assert_eq!(acq.history().len(), 1);
}

#[test]
fn test_channel_switch_between_ticks() {
    let device = device_with_registers(&[(0, 0), (7, 65535)]);
    let mut acq = live_loop(&device, &ConfigBuilder::new().build());
    acq.connection_mut()
        .connect(&settings("COM9", 9600))
        .unwrap();

    assert_eq!(acq.tick().value, 0.0);
    acq.set_channel(Channel::new(8).unwrap());
    common::assert_float_eq(acq.tick().value, 10.0, 1e-9);
    assert_eq!(device.read_log(), vec![(0, 1), (7, 1)]);
}
