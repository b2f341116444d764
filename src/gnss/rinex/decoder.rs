//! Streaming navigation decoder.

use super::error::{ParseWarning, RinexError};
use super::fields::VALUES_PER_LINE;
use super::header::NavHeader;
use super::record::{assemble, RawRecord};
use crate::gnss::ephemeris::Ephemeris;
use crate::gnss::nav_info::GnssNavInfo;
use crate::gnss::types::Epoch;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Line source with one line of look-ahead and 1-based line numbers.
pub(crate) struct LineReader<R> {
    inner: R,
    line_no: usize,
    pushed_back: Option<(usize, String)>,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            line_no: 0,
            pushed_back: None,
        }
    }

    /// Next line without its terminator, `None` at end of input.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<(usize, String)>> {
        if let Some(line) = self.pushed_back.take() {
            return Ok(Some(line));
        }
        let mut buf = String::new();
        if self.inner.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        let trimmed = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed);
        self.line_no += 1;
        Ok(Some((self.line_no, buf)))
    }

    pub(crate) fn push_back(&mut self, line_no: usize, line: String) {
        self.pushed_back = Some((line_no, line));
    }
}

/// Result of one decoding step.
#[derive(Debug, Clone, PartialEq)]
pub enum NavPoll {
    Record(Ephemeris),
    EndOfFile,
}

/// Decoder of one RINEX navigation file.
///
/// The header is parsed on construction; every call to
/// [`poll_next`](Self::poll_next) decodes at most one broadcast message.
/// Messages that cannot be decoded are skipped and recorded as
/// [`ParseWarning`]s.
pub struct NavDecoder<R> {
    lines: LineReader<R>,
    header: NavHeader,
    warnings: Vec<ParseWarning>,
    records: usize,
    finished: bool,
    /// Step decoded by `peek_epoch` and not yet handed out
    peeked: Option<Result<NavPoll, RinexError>>,
}

impl NavDecoder<BufReader<File>> {
    /// Open a file and parse its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RinexError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> NavDecoder<R> {
    pub fn new(reader: R) -> Result<Self, RinexError> {
        let mut lines = LineReader::new(reader);
        let (header, warnings) = NavHeader::parse(&mut lines)?;
        for warning in &warnings {
            tracing::warn!("RINEX header {}", warning);
        }
        Ok(Self {
            lines,
            header,
            warnings,
            records: 0,
            finished: false,
            peeked: None,
        })
    }

    pub fn header(&self) -> &NavHeader {
        &self.header
    }

    /// Warnings recorded so far, header warnings first.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Number of messages decoded so far.
    pub fn records_decoded(&self) -> usize {
        self.records
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decode the next message.
    ///
    /// Only I/O errors are returned as errors; after one, and after the end
    /// of the file, the decoder keeps returning [`NavPoll::EndOfFile`].
    pub fn poll_next(&mut self) -> Result<NavPoll, RinexError> {
        if let Some(step) = self.peeked.take() {
            return step;
        }
        self.step()
    }

    /// Time of clock of the message the next [`poll_next`](Self::poll_next)
    /// returns, without consuming it.
    ///
    /// `None` at the end of the file, and when the next poll reports an
    /// error.
    pub fn peek_epoch(&mut self) -> Option<Epoch> {
        if self.peeked.is_none() {
            self.peeked = Some(self.step());
        }
        match &self.peeked {
            Some(Ok(NavPoll::Record(ephemeris))) => Some(ephemeris.toc),
            _ => None,
        }
    }

    fn step(&mut self) -> Result<NavPoll, RinexError> {
        if self.finished {
            return Ok(NavPoll::EndOfFile);
        }
        match self.decode_next() {
            Ok(Some(ephemeris)) => {
                self.records += 1;
                Ok(NavPoll::Record(ephemeris))
            }
            Ok(None) => {
                self.finished = true;
                Ok(NavPoll::EndOfFile)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    /// Decode the remaining messages into a store seeded with the header.
    pub fn decode_all(&mut self) -> Result<GnssNavInfo, RinexError> {
        let mut info = self.header.to_nav_info();
        while let NavPoll::Record(ephemeris) = self.poll_next()? {
            info.insert(ephemeris);
        }
        Ok(info)
    }

    fn decode_next(&mut self) -> Result<Option<Ephemeris>, RinexError> {
        let format = self.header.format;
        loop {
            let Some((line_no, line)) = self.lines.next_line()? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            if !format.is_record_start(&line) {
                self.skip_orphan_lines()?;
                self.warn(ParseWarning {
                    line: line_no,
                    sat: None,
                    message: "orbit lines outside of a message".into(),
                });
                continue;
            }

            let mut block = vec![(line_no, line)];
            while let Some((next_no, next)) = self.lines.next_line()? {
                if next.trim().is_empty() {
                    continue;
                }
                if format.is_record_start(&next) {
                    self.lines.push_back(next_no, next);
                    break;
                }
                block.push((next_no, next));
            }

            match self.parse_block(&block) {
                Ok(ephemeris) => return Ok(Some(ephemeris)),
                Err(warning) => self.warn(warning),
            }
        }
    }

    fn skip_orphan_lines(&mut self) -> Result<(), RinexError> {
        let format = self.header.format;
        while let Some((line_no, line)) = self.lines.next_line()? {
            if format.is_record_start(&line) {
                self.lines.push_back(line_no, line);
                break;
            }
        }
        Ok(())
    }

    fn parse_block(&self, block: &[(usize, String)]) -> Result<Ephemeris, ParseWarning> {
        let format = self.header.format;
        let (start_no, first) = &block[0];
        let sat = format.parse_sat(first).ok();
        let warning = |line: usize, message: String| ParseWarning { line, sat, message };

        let start = format
            .parse_record_start(first)
            .map_err(|m| warning(*start_no, m))?;
        let mut values = start.values;
        let last = block.len() - 1;
        for (k, (line_no, line)) in block.iter().enumerate().skip(1) {
            let mut orbit = format
                .parse_orbit_line(line)
                .map_err(|m| warning(*line_no, m))?;
            // Only the last line of a message may end early.
            if k < last {
                orbit.resize(VALUES_PER_LINE, 0.0);
            }
            values.extend(orbit);
        }
        assemble(RawRecord {
            sat: start.sat,
            toc: start.toc,
            values,
        })
        .map_err(|m| warning(*start_no, m))
    }

    fn warn(&mut self, warning: ParseWarning) {
        tracing::warn!("Skipped RINEX message at {}", warning);
        self.warnings.push(warning);
    }
}

impl<R: BufRead> Iterator for NavDecoder<R> {
    type Item = Result<Ephemeris, RinexError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.poll_next() {
            Ok(NavPoll::Record(ephemeris)) => Some(Ok(ephemeris)),
            Ok(NavPoll::EndOfFile) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
