//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use navflow::pipeline::{Executor, FinishedRun, Graph, GraphLoader, PinId};
use navflow::GnssNavInfo;
use std::path::PathBuf;
use std::time::Duration;

pub const GPS_FILE: &str = "Skydel-static_4h_1min-rate/SkydelRINEX_S_2022152120_7200S_GN.rnx";
pub const GALILEO_FILE: &str = "Skydel-static_4h_1min-rate/SkydelRINEX_S_2022152120_600S_EN";
pub const GLONASS_FILE: &str = "Skydel-static_4h_1min-rate/SkydelRINEX_S_2022152120_1800S_RN.rnx";
pub const SBAS_FILE: &str = "Skydel-static_4h_1min-rate/SkydelRINEX_S_2022152120_120S_SN";

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Directory source paths in test flows resolve against
pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

pub fn fixture(relative: &str) -> PathBuf {
    fixture_root().join(relative)
}

pub fn flow_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("flow")
        .join(name)
}

pub fn loader() -> GraphLoader {
    GraphLoader::with_fixture_root(fixture_root())
}

/// Load a flow from `tests/flow` and run it to completion on this thread.
pub fn run_flow(name: &str) -> FinishedRun {
    let graph = loader().load_file(flow_path(name)).unwrap();
    Executor::new(graph).run().unwrap()
}

/// Copy of the store published on output pin `pin`.
pub fn store_at(graph: &Graph, pin: u32) -> GnssNavInfo {
    graph
        .find_output_pin(PinId(pin))
        .unwrap()
        .value()
        .and_then(|v| v.as_nav_info())
        .map(|store| store.snapshot())
        .unwrap_or_else(|| panic!("pin {} holds no store", pin))
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
