//! # navflow: GNSS navigation data through a node graph
//!
//! A small dataflow engine whose nodes exchange typed values over pins, plus
//! a streaming decoder for RINEX navigation files that fills an ephemeris
//! store as records arrive.
//!
//! ## Architecture
//!
//! - **gnss**: satellite identities, ephemeris payloads, the shared
//!   [`GnssNavInfo`](gnss::GnssNavInfo) store and the RINEX 2/3 decoder
//! - **pipeline**: pins, nodes, the JSON graph loader, the executor and the
//!   per-run completion registry
//! - **config** / **logger**: TOML run configuration and `tracing` setup
//!
//! ## Example
//!
//! ```no_run
//! use navflow::pipeline::{Executor, GraphLoader, PinId};
//!
//! # fn main() -> navflow::Result<()> {
//! let graph = GraphLoader::with_fixture_root("tests/data")
//!     .load_file("tests/flow/RinexNavFile.flow")?;
//! let mut executor = Executor::new(graph);
//! executor.on_completion(|_graph, report| println!("{}", report));
//! let finished = executor.run()?;
//!
//! let store = finished.graph.find_output_pin(PinId(1))?;
//! if let Some(info) = store.value().and_then(|v| v.as_nav_info()) {
//!     println!("{} satellites", info.read().satellite_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gnss;
pub mod logger;
pub mod pipeline;

// Re-export commonly used types
pub use config::RunConfig;
pub use error::{NavFlowError, Result, ResultExt};
pub use gnss::{Ephemeris, GnssNavInfo, SatId, SharedNavInfo};
pub use logger::Logger;
pub use pipeline::{Executor, Graph, GraphLoader, PipelineError, RunReport};
