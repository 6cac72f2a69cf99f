//! Contest-side collaborators of the bandmap.
//!
//! The bandmap never decides on its own whether a station is worked, which
//! country a call belongs to, or what counts as a multiplier. It asks the
//! traits below. In-memory implementations are provided for the command line
//! tool and for tests; a logging program plugs its own in.

use crate::model::{Band, Spot};
use log::trace;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountryInfo {
    pub cq_zone: i32,
    pub prefix: String,
}

/// Country database. Country indices are positive; 0 means unknown.
pub trait CountryLookup: Send + Sync {
    fn country_of(&self, call: &str) -> Option<i32>;
    fn country_info(&self, country: i32) -> Option<CountryInfo>;
}

/// The contest log as seen by the bandmap.
pub trait WorkedLog: Send + Sync {
    fn lookup(&self, call: &str) -> Option<usize>;
    fn worked_on_band(&self, index: usize, band: Band) -> bool;
    /// False once the station may be worked again (e.g. a new minitest period began).
    fn worked_in_current_period(&self, index: usize) -> bool;
}

/// Source of a previously received exchange for a call.
pub trait ExchangeSource: Send + Sync {
    fn exchange_for(&self, call: &str) -> Option<String>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QtcCounts {
    pub total: u32,
    pub capable: u32,
}

/// QTC bookkeeping for contests exchanging QTC traffic.
pub trait QtcAccounting: Send + Sync {
    fn counts(&self, call: &str) -> QtcCounts;
    fn flag(&self, call: &str) -> Option<char>;
}

pub trait MultiplierCheck: Send + Sync {
    fn is_multiplier(&self, spot: &Spot) -> bool;
}

/// Parses the leading decimal digits of an exchange like `"14"` or `"05 NY"`.
pub fn leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i32>().map(|v| sign * v).unwrap_or(0)
}

/// Enrichment fields attached to a new spot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub cq_zone: i32,
    pub country: i32,
    pub prefix: String,
}

/// Everything the bandmap needs to know about the running contest.
pub struct Contest {
    pub in_contest: bool,
    countries: Arc<dyn CountryLookup>,
    worked: Arc<dyn WorkedLog>,
    zone_exchanges: Vec<Arc<dyn ExchangeSource>>,
    qtc: Option<Arc<dyn QtcAccounting>>,
    multiplier: Arc<dyn MultiplierCheck>,
}

impl Contest {
    pub fn new(countries: Arc<dyn CountryLookup>, worked: Arc<dyn WorkedLog>) -> Self {
        Self {
            in_contest: false,
            countries,
            worked,
            zone_exchanges: Vec::new(),
            qtc: None,
            multiplier: Arc::new(ZoneCountryMultiplier::default()),
        }
    }

    /// A contest without log, country data or multipliers.
    pub fn casual() -> Self {
        Self::new(Arc::new(PrefixTable::new()), Arc::new(MemoryLog::new()))
    }

    pub fn in_contest(mut self, on: bool) -> Self {
        self.in_contest = on;
        self
    }

    /// Zone exchanges from these sources override the database zone, first hit wins.
    pub fn with_zone_exchange(mut self, source: Arc<dyn ExchangeSource>) -> Self {
        self.zone_exchanges.push(source);
        self
    }

    pub fn with_qtc(mut self, qtc: Arc<dyn QtcAccounting>) -> Self {
        self.qtc = Some(qtc);
        self
    }

    pub fn with_multiplier(mut self, check: Arc<dyn MultiplierCheck>) -> Self {
        self.multiplier = check;
        self
    }

    pub fn qtc(&self) -> Option<&dyn QtcAccounting> {
        self.qtc.as_deref()
    }

    pub fn enrich(&self, call: &str) -> Enrichment {
        let country = match self.countries.country_of(call) {
            Some(c) if c > 0 => c,
            _ => return Enrichment::default(),
        };
        let Some(info) = self.countries.country_info(country) else {
            return Enrichment::default();
        };

        let zone = self
            .zone_exchanges
            .iter()
            .find_map(|src| src.exchange_for(call))
            .map(|exch| leading_int(&exch))
            .unwrap_or(info.cq_zone);

        Enrichment {
            cq_zone: zone,
            country,
            prefix: info.prefix,
        }
    }

    pub fn is_dupe(&self, call: &str, band: Band) -> bool {
        if band.is_warc() {
            return false;
        }
        let Some(idx) = self.worked.lookup(call) else {
            return false;
        };

        if let Some(qtc) = &self.qtc {
            let c = qtc.counts(call);
            if c.total > 0 && c.total < 10 {
                return false;
            }
            if c.total == 0 && c.capable > 0 {
                return false;
            }
        }

        if self.worked.worked_on_band(idx, band) {
            return self.worked.worked_in_current_period(idx);
        }
        false
    }

    pub fn is_multiplier(&self, spot: &Spot) -> bool {
        if spot.cq_zone <= 0 || spot.country <= 0 {
            return false;
        }
        self.multiplier.is_multiplier(spot)
    }
}

/// Longest-prefix country table.
#[derive(Debug, Default)]
pub struct PrefixTable {
    prefixes: Vec<(String, i32)>,
    countries: Vec<CountryInfo>,
}

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a country and returns its index (starting at 1).
    pub fn add_country(&mut self, prefix: &str, cq_zone: i32, extra_prefixes: &[&str]) -> i32 {
        self.countries.push(CountryInfo {
            cq_zone,
            prefix: prefix.to_string(),
        });
        let idx = self.countries.len() as i32;
        for p in std::iter::once(&prefix).chain(extra_prefixes.iter()) {
            self.prefixes.push((p.to_ascii_uppercase(), idx));
        }
        // longest first so the first hit is the best one
        self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        idx
    }
}

impl CountryLookup for PrefixTable {
    fn country_of(&self, call: &str) -> Option<i32> {
        let call = call.to_ascii_uppercase();
        let hit = self
            .prefixes
            .iter()
            .find(|(p, _)| call.starts_with(p.as_str()))
            .map(|(_, idx)| *idx);
        trace!("country lookup {} -> {:?}", call, hit);
        hit
    }

    fn country_info(&self, country: i32) -> Option<CountryInfo> {
        if country <= 0 {
            return None;
        }
        self.countries.get(country as usize - 1).cloned()
    }
}

#[derive(Clone, Debug)]
struct WorkedEntry {
    call: String,
    bands: HashSet<Band>,
    exchange: String,
    in_period: bool,
}

/// Simple contest log kept in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<WorkedEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_qso(&self, call: &str, band: Band, exchange: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|e| e.call == call) {
            Some(e) => {
                e.bands.insert(band);
                e.exchange = exchange.to_string();
                e.in_period = true;
            }
            None => entries.push(WorkedEntry {
                call: call.to_string(),
                bands: HashSet::from([band]),
                exchange: exchange.to_string(),
                in_period: true,
            }),
        }
    }

    /// Starts a new contest period: every station becomes workable again.
    pub fn new_period(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for e in entries.iter_mut() {
            e.in_period = false;
        }
    }
}

impl WorkedLog for MemoryLog {
    fn lookup(&self, call: &str) -> Option<usize> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().position(|e| e.call == call)
    }

    fn worked_on_band(&self, index: usize, band: Band) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(index).is_some_and(|e| e.bands.contains(&band))
    }

    fn worked_in_current_period(&self, index: usize) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(index).is_some_and(|e| e.in_period)
    }
}

impl ExchangeSource for MemoryLog {
    fn exchange_for(&self, call: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|e| e.call == call && !e.exchange.is_empty())
            .map(|e| e.exchange.clone())
    }
}

/// Exchanges known before the contest (call history file).
#[derive(Debug, Default)]
pub struct InitialExchange {
    by_call: HashMap<String, String>,
}

impl InitialExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call: &str, exchange: &str) {
        self.by_call.insert(call.to_string(), exchange.to_string());
    }
}

impl ExchangeSource for InitialExchange {
    fn exchange_for(&self, call: &str) -> Option<String> {
        self.by_call.get(call).cloned()
    }
}

/// A spot is a multiplier if its zone or country has not been worked yet.
#[derive(Debug)]
pub struct ZoneCountryMultiplier {
    pub count_zones: bool,
    pub count_countries: bool,
    worked_zones: Mutex<HashSet<i32>>,
    worked_countries: Mutex<HashSet<i32>>,
}

impl Default for ZoneCountryMultiplier {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl ZoneCountryMultiplier {
    pub fn new(count_zones: bool, count_countries: bool) -> Self {
        Self {
            count_zones,
            count_countries,
            worked_zones: Mutex::new(HashSet::new()),
            worked_countries: Mutex::new(HashSet::new()),
        }
    }

    pub fn mark_worked(&self, cq_zone: i32, country: i32) {
        self.worked_zones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cq_zone);
        self.worked_countries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(country);
    }
}

impl MultiplierCheck for ZoneCountryMultiplier {
    fn is_multiplier(&self, spot: &Spot) -> bool {
        let new_zone = self.count_zones
            && !self
                .worked_zones
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&spot.cq_zone);
        let new_country = self.count_countries
            && !self
                .worked_countries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&spot.country);
        new_zone || new_country
    }
}
