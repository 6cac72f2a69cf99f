use crate::bands::BandPlan;
use crate::contest::Contest;
use crate::model::{Band, Frequency, Mode, Spot, TOLERANCE, distance};
use crate::store::{DEFAULT_LIFETIME, SpotStore};
use log::trace;
use serde::{Deserialize, Serialize};

/// Display options of the bandmap, toggled at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandmapConfig {
    pub all_bands: bool,
    pub all_modes: bool,
    pub show_dupes: bool,
    /// Skip dupes when grabbing the next spot up or down.
    pub skip_dupes: bool,
    /// Fresh TTL in aging ticks.
    pub lifetime: u32,
    pub only_multipliers: bool,
}

impl Default for BandmapConfig {
    fn default() -> Self {
        Self {
            all_bands: true,
            all_modes: true,
            show_dupes: true,
            skip_dupes: true,
            lifetime: DEFAULT_LIFETIME,
            only_multipliers: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Bands,
    Modes,
    Dupes,
    OnlyMultipliers,
}

impl Toggle {
    /// Menu key: B, M, D or O.
    pub fn from_key(c: char) -> Option<Toggle> {
        match c.to_ascii_uppercase() {
            'B' => Some(Toggle::Bands),
            'M' => Some(Toggle::Modes),
            'D' => Some(Toggle::Dupes),
            'O' => Some(Toggle::OnlyMultipliers),
            _ => None,
        }
    }
}

impl BandmapConfig {
    pub fn toggle(&mut self, t: Toggle) {
        match t {
            Toggle::Bands => self.all_bands = !self.all_bands,
            Toggle::Modes => self.all_modes = !self.all_modes,
            Toggle::Dupes => self.show_dupes = !self.show_dupes,
            Toggle::OnlyMultipliers => self.only_multipliers = !self.only_multipliers,
        }
    }

    /// Band/mode part of the filter; dupe and multiplier checks happen in [`build`].
    pub fn accept(&self, s: &Spot, tuning: &Tuning) -> bool {
        (self.all_bands || s.band == tuning.band) && (self.all_modes || s.mode == tuning.mode)
    }
}

/// Where the operator currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuning {
    pub band: Band,
    pub mode: Mode,
    /// Frequency read from the rig, if one is connected.
    pub rig_frequency: Option<Frequency>,
}

impl Tuning {
    pub fn from_rig(plan: &dyn BandPlan, freq: Frequency) -> Option<Tuning> {
        let band = plan.band_of(freq)?;
        Some(Tuning {
            band,
            mode: plan.mode_of(freq, band),
            rig_frequency: Some(freq),
        })
    }

    pub fn manual(band: Band, mode: Mode) -> Tuning {
        Tuning { band, mode, rig_frequency: None }
    }

    pub fn has_rig(&self) -> bool {
        self.rig_frequency.is_some()
    }

    /// Rig frequency, or the middle of the band/mode segment without a rig.
    pub fn center(&self, plan: &dyn BandPlan) -> Frequency {
        self.rig_frequency
            .unwrap_or_else(|| plan.center_of(self.band, self.mode))
    }
}

/// Filtered copy of the store for one render cycle. Owns its spots; the
/// store's lock is not held while it is read.
#[derive(Clone, Debug, Default)]
pub struct FilterView {
    spots: Vec<Spot>,
    skip_dupes: bool,
}

/// Builds the view under the store's lock, refreshing each spot's dupe flag.
/// The configured lifetime is handed to the store for the spots that follow.
pub fn build(store: &SpotStore, cfg: &BandmapConfig, tuning: &Tuning) -> FilterView {
    store.set_lifetime(cfg.lifetime);
    let contest: &Contest = store.contest();
    let mut spots = Vec::new();

    store.visit_mut(|s| {
        s.dupe = contest.is_dupe(&s.call, s.band);

        if contest.in_contest && s.band.is_warc() {
            return;
        }
        if s.dupe && !cfg.show_dupes {
            return;
        }
        if cfg.only_multipliers && !contest.is_multiplier(s) {
            return;
        }
        if cfg.accept(s, tuning) {
            spots.push(s.clone());
        }
    });

    trace!("filtered view: {} spot(s)", spots.len());
    FilterView {
        spots,
        skip_dupes: cfg.skip_dupes,
    }
}

impl FilterView {
    pub fn from_spots(spots: Vec<Spot>, skip_dupes: bool) -> Self {
        Self { spots, skip_dupes }
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Lowest-frequency spot whose call contains `needle`.
    pub fn lookup_by_call_substring(&self, needle: &str) -> Option<Spot> {
        if needle.is_empty() {
            return None;
        }
        self.spots.iter().find(|s| s.call.contains(needle)).cloned()
    }

    /// Next spot above (or below) `freq`, allowing half the tolerance of headroom
    /// so the spot the rig sits on is not picked again.
    pub fn lookup_adjacent(&self, upwards: bool, freq: Frequency) -> Option<Spot> {
        let skip = |s: &&Spot| !(self.skip_dupes && s.dupe);
        if upwards {
            let f0 = freq.saturating_add(TOLERANCE / 2);
            self.spots.iter().filter(skip).find(|s| s.frequency > f0).cloned()
        } else {
            let f0 = freq.saturating_sub(TOLERANCE / 2);
            self.spots.iter().rev().filter(skip).find(|s| s.frequency < f0).cloned()
        }
    }

    /// Call of the first spot within tolerance of `freq`, if any.
    pub fn spot_on_frequency(&self, freq: Frequency) -> Option<&str> {
        self.spots
            .iter()
            .find(|s| distance(s.frequency, freq) < TOLERANCE && !(self.skip_dupes && s.dupe))
            .map(|s| s.call.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::IaruBandPlan;
    use crate::contest::{MemoryLog, PrefixTable, ZoneCountryMultiplier};
    use crate::model::NO_NODE;
    use std::sync::Arc;

    fn spot(call: &str, freq: Frequency, dupe: bool) -> Spot {
        Spot {
            call: call.into(),
            frequency: freq,
            mode: Mode::Cw,
            band: Band::M20,
            node: NO_NODE,
            ttl: 900,
            dupe,
            cq_zone: 5,
            country: 1,
            prefix: "K".into(),
        }
    }

    fn contest_with_log() -> (Arc<MemoryLog>, Contest) {
        let mut table = PrefixTable::new();
        table.add_country("K", 5, &["W"]);
        table.add_country("DL", 14, &[]);
        let log = Arc::new(MemoryLog::new());
        let contest = Contest::new(Arc::new(table), log.clone());
        (log, contest)
    }

    fn twenty_cw() -> Tuning {
        Tuning::manual(Band::M20, Mode::Cw)
    }

    #[test]
    fn toggles_follow_menu_keys() {
        let mut cfg = BandmapConfig::default();
        for k in ['b', 'M', 'd', 'O'] {
            cfg.toggle(Toggle::from_key(k).unwrap());
        }
        assert!(!cfg.all_bands && !cfg.all_modes && !cfg.show_dupes && cfg.only_multipliers);
        assert_eq!(Toggle::from_key('x'), None);
    }

    #[test]
    fn dupes_are_marked_and_hidden_on_request() {
        let (log, contest) = contest_with_log();
        log.log_qso("W1ABC", Band::M20, "5");
        let store = SpotStore::new(900, Arc::new(IaruBandPlan::new()), Arc::new(contest));
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        store.add_or_refresh("W2XYZ", 14_030_000, NO_NODE);

        let mut cfg = BandmapConfig::default();
        let view = build(&store, &cfg, &twenty_cw());
        assert_eq!(view.len(), 2);
        assert!(view.spots()[0].dupe);
        assert!(store.snapshot()[0].dupe);

        cfg.toggle(Toggle::Dupes);
        let view = build(&store, &cfg, &twenty_cw());
        assert_eq!(view.len(), 1);
        assert_eq!(view.spots()[0].call, "W2XYZ");
    }

    #[test]
    fn own_band_and_mode_filters() {
        let store = SpotStore::new(900, Arc::new(IaruBandPlan::new()), Arc::new(Contest::casual()));
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        store.add_or_refresh("W2XYZ", 14_250_000, NO_NODE);
        store.add_or_refresh("W3LPL", 7_025_000, NO_NODE);

        let mut cfg = BandmapConfig::default();
        assert_eq!(build(&store, &cfg, &twenty_cw()).len(), 3);

        cfg.all_bands = false;
        assert_eq!(build(&store, &cfg, &twenty_cw()).len(), 2);

        cfg.all_modes = false;
        let view = build(&store, &cfg, &twenty_cw());
        assert_eq!(view.len(), 1);
        assert_eq!(view.spots()[0].call, "W1ABC");
    }

    #[test]
    fn warc_spots_hidden_in_contest_only() {
        let plan = Arc::new(IaruBandPlan::new());
        let casual = SpotStore::new(900, plan.clone(), Arc::new(Contest::casual()));
        casual.add_or_refresh("W1ABC", 10_110_000, NO_NODE);
        assert_eq!(build(&casual, &BandmapConfig::default(), &twenty_cw()).len(), 1);

        let contest = SpotStore::new(900, plan, Arc::new(Contest::casual().in_contest(true)));
        contest.add_or_refresh("W1ABC", 10_110_000, NO_NODE);
        assert!(build(&contest, &BandmapConfig::default(), &twenty_cw()).is_empty());
    }

    #[test]
    fn only_multipliers_drops_worked_and_unknown_countries() {
        let (_log, contest) = contest_with_log();
        let mults = Arc::new(ZoneCountryMultiplier::default());
        mults.mark_worked(5, 1);
        let contest = contest.with_multiplier(mults);
        let store = SpotStore::new(900, Arc::new(IaruBandPlan::new()), Arc::new(contest));
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        store.add_or_refresh("DL1AAA", 14_030_000, NO_NODE);
        store.add_or_refresh("JA1ZZZ", 14_035_000, NO_NODE);

        let cfg = BandmapConfig {
            only_multipliers: true,
            ..BandmapConfig::default()
        };
        let view = build(&store, &cfg, &twenty_cw());
        let calls: Vec<&str> = view.spots().iter().map(|s| s.call.as_str()).collect();
        assert_eq!(calls, vec!["DL1AAA"]);
    }

    #[test]
    fn configured_lifetime_reaches_new_spots() {
        let store = SpotStore::new(900, Arc::new(IaruBandPlan::new()), Arc::new(Contest::casual()));
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);

        let cfg = BandmapConfig {
            lifetime: 60,
            ..BandmapConfig::default()
        };
        build(&store, &cfg, &twenty_cw());
        store.add_or_refresh("W2XYZ", 14_030_000, NO_NODE);

        let spots = store.snapshot();
        assert_eq!(spots[0].ttl, 900);
        assert_eq!(spots[1].ttl, 60);
        assert_eq!(store.lifetime(), cfg.lifetime);
    }

    #[test]
    fn view_is_independent_of_later_mutation() {
        let store = SpotStore::new(900, Arc::new(IaruBandPlan::new()), Arc::new(Contest::casual()));
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        let view = build(&store, &BandmapConfig::default(), &twenty_cw());
        store.add_or_refresh("W2XYZ", 14_025_010, NO_NODE);
        store.age_tick();
        assert_eq!(view.spots()[0].call, "W1ABC");
        assert_eq!(view.spots()[0].ttl, 900);
    }

    #[test]
    fn call_substring_lookup_returns_lowest_match() {
        let view = FilterView::from_spots(
            vec![spot("DL1ABC", 14_010_000, false), spot("W1ABC", 14_020_000, false)],
            true,
        );
        assert_eq!(view.lookup_by_call_substring("ABC").unwrap().call, "DL1ABC");
        assert_eq!(view.lookup_by_call_substring("W1").unwrap().call, "W1ABC");
        assert!(view.lookup_by_call_substring("").is_none());
        assert!(view.lookup_by_call_substring("K9").is_none());
    }

    #[test]
    fn adjacent_lookup_uses_half_tolerance_headroom() {
        let spots = vec![
            spot("A1", 14_010_000, false),
            spot("B2", 14_020_040, false),
            spot("C3", 14_030_000, true),
            spot("D4", 14_040_000, false),
        ];
        let view = FilterView::from_spots(spots.clone(), true);

        // B2 is only 40 Hz above: within headroom, so skip to the next one
        assert_eq!(view.lookup_adjacent(true, 14_020_000).unwrap().call, "D4");
        assert_eq!(view.lookup_adjacent(false, 14_020_040).unwrap().call, "A1");
        assert_eq!(view.lookup_adjacent(false, 14_040_000).unwrap().call, "B2");
        assert!(view.lookup_adjacent(true, 14_040_000).is_none());

        let with_dupes = FilterView::from_spots(spots, false);
        assert_eq!(with_dupes.lookup_adjacent(true, 14_020_000).unwrap().call, "C3");
        assert!(FilterView::default().lookup_adjacent(true, 0).is_none());
    }

    #[test]
    fn spot_on_frequency_skips_dupes() {
        let view = FilterView::from_spots(
            vec![spot("DUPE", 14_025_000, true), spot("W1ABC", 14_025_090, false)],
            true,
        );
        assert_eq!(view.spot_on_frequency(14_025_050), Some("W1ABC"));
        assert_eq!(view.spot_on_frequency(14_026_000), None);
    }
}
