//! Capture analysis driver.
//!
//! Feeds every frame of one or more captures, in order, through a
//! [`ConnectionTable`] and hands completed queries to its sink.

use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::mysql::QuerySink;
use crate::pcap::PcapReader;
use crate::protocol::ETHERNET_HEADER_LEN;
use crate::stats::{QueryStats, StatBucket};
use crate::stream::{ConnectionTable, TableConfig, TableStats};

/// Frames between two progress callbacks.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000;

/// Frames inspected by [`guess_host_mac`] by default.
pub const MAC_GUESS_FRAMES: usize = 200;

/// Runs captures through a connection table.
///
/// Connections live in the table across calls to [`Analyzer::run`], so a
/// capture split over several files can be analyzed by running the files
/// in order.
pub struct Analyzer<S> {
    table: ConnectionTable<S>,
    progress_interval: u64,
}

impl<S: QuerySink> Analyzer<S> {
    pub fn new(config: TableConfig, sink: S) -> Self {
        Self {
            table: ConnectionTable::new(config, sink),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Call the progress callback every `frames` frames (at least 1).
    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames.max(1);
        self
    }

    /// Process every frame of `reader`.
    ///
    /// `progress` is called with the running counters every progress
    /// interval. Returns the number of frames read. A frame whose headers
    /// cannot be decoded stops the run with [`crate::Error::Protocol`].
    pub fn run<R, F>(&mut self, reader: &mut PcapReader<R>, mut progress: F) -> Result<u64>
    where
        R: Read,
        F: FnMut(&TableStats),
    {
        let mut frames = 0u64;

        while let Some(frame) = reader.next_packet()? {
            if let Err(e) = self.table.on_frame(&frame) {
                tracing::error!(frame = frame.frame_number, error = %e, "undecodable frame");
                return Err(e.into());
            }

            frames += 1;
            if frames % self.progress_interval == 0 {
                progress(self.table.stats());
            }
        }

        Ok(frames)
    }

    /// Open `path` (plain or gzip) and process it.
    pub fn run_file<P, F>(&mut self, path: P, progress: F) -> Result<u64>
    where
        P: AsRef<Path>,
        F: FnMut(&TableStats),
    {
        let path = path.as_ref();
        let mut reader = PcapReader::open(path)?;
        let frames = self.run(&mut reader, progress)?;
        tracing::debug!(path = %path.display(), frames, "capture processed");
        Ok(frames)
    }

    pub fn table(&self) -> &ConnectionTable<S> {
        &self.table
    }

    pub fn stats(&self) -> &TableStats {
        self.table.stats()
    }

    /// End the analysis and return the sink with the final counters.
    pub fn finish(self) -> (S, TableStats) {
        let (sink, stats) = self.table.finish();
        tracing::info!(
            frames = stats.frames,
            skipped = stats.frames_skipped,
            connections = stats.connections_opened,
            corrupted = stats.connections_corrupted,
            queries = stats.queries,
            "analysis complete"
        );
        (sink, stats)
    }
}

/// Analyze one capture file into per-shape statistics.
pub fn analyze_file<P: AsRef<Path>>(
    path: P,
    config: TableConfig,
) -> Result<(QueryStats, TableStats)> {
    let mut analyzer = Analyzer::new(config, QueryStats::new());
    analyzer.run_file(path, |_| {})?;
    Ok(analyzer.finish())
}

/// Guess the capturing host's MAC address.
///
/// Counts source and destination addresses over the first `frames` frames
/// and returns the most frequent one, the lowest address winning ties.
/// Frames too short for an Ethernet header are ignored. Returns `None` when
/// no frame was usable.
pub fn guess_host_mac<R: Read>(
    reader: &mut PcapReader<R>,
    frames: usize,
) -> Result<Option<[u8; 6]>> {
    let mut macs: StatBucket<[u8; 6]> = StatBucket::new();

    for _ in 0..frames {
        let Some(frame) = reader.next_packet()? else {
            break;
        };
        if frame.data.len() < ETHERNET_HEADER_LEN {
            continue;
        }

        let mut destination = [0u8; 6];
        let mut source = [0u8; 6];
        destination.copy_from_slice(&frame.data[0..6]);
        source.copy_from_slice(&frame.data[6..12]);
        macs.insert(destination, 1);
        macs.insert(source, 1);
    }

    Ok(macs.ranked().first().map(|(mac, _)| **mac))
}
