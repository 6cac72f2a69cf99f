//! Bandmap state file.
//!
//! Line 1 holds the Unix time of the save. Every other line is one spot:
//! `call;frequency;mode;band;node;ttl;dupe;cqzone;country;prefix`.
//! On load the downtime since the save is subtracted from each TTL.

use crate::errors::BandmapError;
use crate::model::{Band, Mode, NO_NODE, Spot};
use crate::store::SpotStore;
use chrono::Utc;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use log::{debug, info, trace, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const DEFAULT_STATE_FILE: &str = ".bmdata.dat";

const DELIMITER: u8 = b';';

#[inline]
fn is_separator(c: char) -> bool {
    c == ';' || c == '\n' || c == '\r'
}

#[inline]
fn clean_field(s: &str) -> String {
    s.chars().filter(|c| !is_separator(*c)).collect()
}

/// A node id that would split the line is written as "no node".
#[inline]
fn clean_node(node: char) -> char {
    if is_separator(node) { NO_NODE } else { node }
}

/// Writes `spots` with `saved_at` as the leading timestamp.
pub fn write_spots<W: Write>(mut out: W, spots: &[Spot], saved_at: i64) -> Result<(), BandmapError> {
    writeln!(out, "{}", saved_at)?;

    let mut wtr = WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(out);

    for s in spots {
        wtr.write_record(&[
            clean_field(&s.call),
            s.frequency.to_string(),
            s.mode.index().to_string(),
            s.band.index().to_string(),
            clean_node(s.node).to_string(),
            s.ttl.to_string(),
            u8::from(s.dupe).to_string(),
            s.cq_zone.to_string(),
            s.country.to_string(),
            clean_field(s.prefix.trim_end()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Saves the store. The file is opened before the store is touched, so a
/// failure leaves everything as it was and is returned to the caller.
pub fn save(store: &SpotStore, path: &Path) -> Result<(), BandmapError> {
    save_at(store, path, Utc::now().timestamp())
}

pub fn save_at(store: &SpotStore, path: &Path, now: i64) -> Result<(), BandmapError> {
    let file = File::create(path).map_err(|e| {
        warn!("can't open bandmap data file {}: {}", path.display(), e);
        BandmapError::IO(format!("open {}: {}", path.display(), e))
    })?;

    let spots = store.snapshot();
    write_spots(BufWriter::new(file), &spots, now)?;
    debug!("saved {} spot(s) to {}", spots.len(), path.display());
    Ok(())
}

fn field<'a>(rec: &'a StringRecord, i: usize) -> &'a str {
    rec.get(i).unwrap_or("")
}

fn num<T: std::str::FromStr + Default>(rec: &StringRecord, i: usize) -> T {
    field(rec, i).trim().parse::<T>().unwrap_or_default()
}

/// Turns one saved line into a spot; missing numeric fields read as zero.
fn parse_record(rec: &StringRecord) -> Option<Spot> {
    let call = field(rec, 0).trim();
    if call.is_empty() {
        return None;
    }
    let mode = Mode::from_index(num(rec, 2))?;
    let band = Band::from_index(num(rec, 3))?;

    Some(Spot {
        call: call.to_string(),
        frequency: num(rec, 1),
        mode,
        band,
        node: field(rec, 4).chars().next().unwrap_or(NO_NODE),
        ttl: num(rec, 5),
        dupe: num::<i32>(rec, 6) != 0,
        cq_zone: num(rec, 7),
        country: num(rec, 8),
        prefix: field(rec, 9).trim_end().to_string(),
    })
}

/// Reads saved spots, aging them by the time elapsed since `saved_at`.
/// Spots whose TTL does not outlast the downtime are dropped.
pub fn read_spots<R: Read>(input: R, now: i64) -> Vec<Spot> {
    let mut reader = BufReader::new(input);

    let mut header = String::new();
    let elapsed = match reader.read_line(&mut header) {
        Ok(0) => return Vec::new(),
        Ok(_) => match header.trim().parse::<i64>() {
            Ok(saved_at) => now.saturating_sub(saved_at).max(0),
            Err(_) => {
                debug!("state file: bad timestamp {:?}, assuming no downtime", header.trim());
                0
            }
        },
        Err(e) => {
            debug!("state file: unreadable header: {}", e);
            return Vec::new();
        }
    };

    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = match rec {
            Ok(r) => r,
            Err(e) => {
                debug!("state file: skipped line: {}", e);
                continue;
            }
        };
        let Some(mut spot) = parse_record(&rec) else {
            trace!("state file: malformed line {:?}", rec);
            continue;
        };
        if spot.ttl > elapsed {
            spot.ttl -= elapsed;
            out.push(spot);
        } else {
            trace!("state file: {} expired during downtime", spot.call);
        }
    }
    out
}

/// Restores the store from `path`, once per store. Returns the number of
/// spots restored; a missing file is not an error.
pub fn load(store: &SpotStore, path: &Path) -> usize {
    load_at(store, path, Utc::now().timestamp())
}

pub fn load_at(store: &SpotStore, path: &Path, now: i64) -> usize {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("no bandmap state at {}: {}", path.display(), e);
            return 0;
        }
    };
    if !store.claim_restore() {
        debug!("bandmap state already restored; skipping {}", path.display());
        return 0;
    }

    let spots = read_spots(file, now);
    let n = store.restore(spots);
    info!("restored {} spot(s) from {}", n, path.display());
    n
}
