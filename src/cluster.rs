use crate::errors::BandmapError;
use crate::model::{Frequency, NO_NODE};
use crate::store::SpotStore;
use log::{debug, info, trace};
use regex::Regex;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Spotters named `TLF-<c>` are other logging stations of the same network.
const NODE_SPOTTER_PREFIX: &str = "TLF-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterSpot {
    pub call: String,
    pub frequency: Frequency,
    pub node: char,
}

#[inline]
fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{FEFF}').unwrap_or(s)
}

pub struct SpotParser {
    re: Regex,
}

impl SpotParser {
    pub fn new() -> Result<Self, BandmapError> {
        // DX de W3LPL:     14025.0  W1ABC        CW 599               1234Z
        let re = Regex::new(r"^DX de ([^\s:]+):?\s+(\d+(?:\.\d*)?)\s+([A-Za-z0-9/]+)")
            .map_err(|e| BandmapError::Parse(format!("spot pattern: {}", e)))?;
        Ok(Self { re })
    }

    /// Extracts call, frequency (Hz) and reporting node from a "DX de" line.
    pub fn parse(&self, line: &str) -> Option<ClusterSpot> {
        let s = strip_bom(line).trim_end();
        let caps = self.re.captures(s)?;

        let spotter = caps.get(1)?.as_str();
        let khz: f64 = caps.get(2)?.as_str().parse().ok()?;
        let call = caps.get(3)?.as_str().to_ascii_uppercase();

        let hz = (khz * 1000.0).round();
        if !(0.0..=f64::from(u32::MAX)).contains(&hz) {
            return None;
        }

        let node = spotter
            .strip_prefix(NODE_SPOTTER_PREFIX)
            .and_then(|rest| rest.chars().next())
            .unwrap_or(NO_NODE);

        Some(ClusterSpot {
            call,
            frequency: hz as Frequency,
            node,
        })
    }
}

/// Streams cluster lines into the store until EOF. Returns the number of spots seen.
pub async fn feed<R: AsyncBufRead + Unpin>(
    reader: R,
    parser: &SpotParser,
    store: &SpotStore,
) -> Result<usize, BandmapError> {
    let mut lines = reader.lines();
    let mut count = 0usize;

    while let Some(line) = lines.next_line().await? {
        match parser.parse(&line) {
            Some(spot) => {
                trace!("cluster: {} {} node={:?}", spot.call, spot.frequency, spot.node);
                store.add_or_refresh(&spot.call, spot.frequency, spot.node);
                count = count.saturating_add(1);
            }
            None => {
                trace!("cluster: skipped line");
            }
        }
    }

    debug!("cluster feed ended after {} spot(s)", count);
    Ok(count)
}

pub async fn feed_file(path: &Path, parser: &SpotParser, store: &SpotStore) -> Result<usize, BandmapError> {
    let file = File::open(path)
        .await
        .map_err(|e| BandmapError::IO(format!("open {}: {}", path.display(), e)))?;
    info!("Reading cluster log {}", path.display());
    feed(BufReader::new(file), parser, store).await
}
