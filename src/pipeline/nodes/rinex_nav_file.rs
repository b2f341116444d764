//! RinexNavFileNode — navigation file source.
//!
//! Decodes one broadcast message per poll. Every decoded record is appended
//! to the node's own store; the store handle is written to the `GnssNavInfo`
//! output and the record itself to the `Ephemeris` output.

use crate::gnss::rinex::{NavDecoder, NavPoll, RinexError};
use crate::gnss::{Epoch, SharedNavInfo};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::{NodeAction, NodeContext, NodeStats, StreamEnd};
use crate::pipeline::params::NodeParams;
use crate::pipeline::pin::{PinKind, PinValue};
use crate::pipeline::port::PortDescriptor;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::output("GnssNavInfo", PinKind::NavInfo),
    PortDescriptor::output("Ephemeris", PinKind::Ephemeris),
];

const NAV_INFO_OUT: usize = 0;
const EPHEMERIS_OUT: usize = 1;

/// Source node reading a RINEX navigation file.
pub struct RinexNavFileNode {
    path: PathBuf,
    decoder: Option<NavDecoder<BufReader<File>>>,
    store: SharedNavInfo,
    /// Decoder error raised while reading the header, reported on first poll
    header_error: Option<String>,
    records: u64,
    /// Warnings kept after the decoder is released
    warnings: Vec<String>,
}

impl RinexNavFileNode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            decoder: None,
            store: SharedNavInfo::default(),
            header_error: None,
            records: 0,
            warnings: Vec::new(),
        }
    }

    /// Build from description parameters; `path` resolves against `root`.
    pub fn from_params(params: &NodeParams, root: &Path) -> PipelineResult<Self> {
        params.expect_only("RinexNavFile", &["path"])?;
        let path = params.require_str("RinexNavFile", "path")?;
        Ok(Self::new(root.join(path)))
    }

    pub fn name(&self) -> &str {
        "RinexNavFile"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store filled by this node.
    pub fn store(&self) -> &SharedNavInfo {
        &self.store
    }

    pub fn on_activate(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        let file = File::open(&self.path).map_err(|e| {
            PipelineError::Startup(format!(
                "node '{}' cannot open {}: {}",
                ctx.handle,
                self.path.display(),
                e
            ))
        })?;

        match NavDecoder::new(BufReader::new(file)) {
            Ok(decoder) => {
                tracing::info!(
                    "RinexNavFile '{}' opened {} (RINEX {})",
                    ctx.handle,
                    self.path.display(),
                    decoder.header().version
                );
                *self.store.write() = decoder.header().to_nav_info();
                self.decoder = Some(decoder);
            }
            Err(RinexError::Io(e)) => {
                return Err(PipelineError::Startup(format!(
                    "node '{}' cannot read {}: {}",
                    ctx.handle,
                    self.path.display(),
                    e
                )));
            }
            Err(e) => {
                tracing::error!(
                    "RinexNavFile '{}' cannot decode {}: {}",
                    ctx.handle,
                    self.path.display(),
                    e
                );
                self.header_error = Some(e.to_string());
            }
        }

        // Downstream sees the (possibly empty) store before the first record.
        ctx.write(NAV_INFO_OUT, PinValue::NavInfo(self.store.clone()));
        Ok(())
    }

    pub fn poll_next(&mut self, ctx: &mut NodeContext) -> NodeAction {
        if let Some(reason) = self.header_error.take() {
            return NodeAction::EndOfStream(StreamEnd::Failed(reason));
        }
        let Some(decoder) = self.decoder.as_mut() else {
            return NodeAction::EndOfStream(StreamEnd::Exhausted);
        };

        match decoder.poll_next() {
            Ok(NavPoll::Record(ephemeris)) => {
                self.records += 1;
                self.store.write().insert(ephemeris.clone());
                ctx.write(NAV_INFO_OUT, PinValue::NavInfo(self.store.clone()));
                ctx.write(EPHEMERIS_OUT, PinValue::Ephemeris(Arc::new(ephemeris)));
                NodeAction::Produced
            }
            Ok(NavPoll::EndOfFile) => {
                tracing::info!(
                    "RinexNavFile '{}' finished: {} messages, {} satellites, {} warnings",
                    ctx.handle,
                    self.records,
                    self.store.read().satellite_count(),
                    decoder.warnings().len()
                );
                NodeAction::EndOfStream(StreamEnd::Exhausted)
            }
            Err(e) => {
                tracing::error!("RinexNavFile '{}' stopped: {}", ctx.handle, e);
                NodeAction::EndOfStream(StreamEnd::Failed(e.to_string()))
            }
        }
    }

    /// Time of clock of the next message in the file.
    pub fn next_epoch(&mut self) -> Option<Epoch> {
        if self.header_error.is_some() {
            return None;
        }
        self.decoder.as_mut()?.peek_epoch()
    }

    pub fn on_deactivate(&mut self, _ctx: &mut NodeContext) {
        if let Some(decoder) = self.decoder.take() {
            self.warnings = decoder.warnings().iter().map(ToString::to_string).collect();
        }
    }

    pub fn stats(&self) -> NodeStats {
        let warnings = match &self.decoder {
            Some(decoder) => decoder.warnings().iter().map(ToString::to_string).collect(),
            None => self.warnings.clone(),
        };
        NodeStats {
            records: self.records,
            warnings,
        }
    }
}
