//! The live collection of spots, ordered by frequency.
//!
//! Every mutation (merge plus neighbor cleanup, aging, restore) runs to
//! completion under one mutex, so readers never see a half-sorted store or a
//! merged spot whose colliding neighbors are still present.

use crate::bands::BandPlan;
use crate::contest::Contest;
use crate::model::{distance, Frequency, Spot, MAX_HF_FREQUENCY, TOLERANCE};
use log::{debug, trace};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default spot lifetime in aging ticks (one tick per second).
pub const DEFAULT_LIFETIME: u32 = 900;

pub struct SpotStore {
    spots: Mutex<Vec<Spot>>,
    lifetime: AtomicU32,
    plan: Arc<dyn BandPlan>,
    contest: Arc<Contest>,
    restored: AtomicBool,
}

impl SpotStore {
    pub fn new(lifetime: u32, plan: Arc<dyn BandPlan>, contest: Arc<Contest>) -> Self {
        Self {
            spots: Mutex::new(Vec::with_capacity(128)),
            lifetime: AtomicU32::new(lifetime.max(1)),
            plan,
            contest,
            restored: AtomicBool::new(false),
        }
    }

    /// TTL given to a spot when it is created or refreshed.
    pub fn lifetime(&self) -> u32 {
        self.lifetime.load(Ordering::Relaxed)
    }

    /// Changes the TTL used for later adds and refreshes; live spots keep theirs.
    pub fn set_lifetime(&self, lifetime: u32) {
        let lifetime = lifetime.max(1);
        if self.lifetime.swap(lifetime, Ordering::Relaxed) != lifetime {
            debug!("spot lifetime set to {}", lifetime);
        }
    }

    pub fn band_plan(&self) -> &dyn BandPlan {
        self.plan.as_ref()
    }

    pub fn contest(&self) -> &Contest {
        self.contest.as_ref()
    }

    fn locked(&self) -> MutexGuard<'_, Vec<Spot>> {
        self.spots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    /// Adds a spot or refreshes the existing one for the same call, band and mode.
    ///
    /// Frequencies outside the HF amateur bands are ignored. A spot that was
    /// created or moved survives; any neighbor closer than [`TOLERANCE`] is dropped.
    pub fn add_or_refresh(&self, call: &str, freq: Frequency, node: char) {
        let call = call.trim();
        if call.is_empty() || freq > MAX_HF_FREQUENCY {
            trace!("spot rejected: call={:?} freq={}", call, freq);
            return;
        }
        let Some(band) = self.plan.band_of(freq) else {
            trace!("spot rejected: {} at {} is outside any band", call, freq);
            return;
        };
        let mode = self.plan.mode_of(freq, band);

        let lifetime = self.lifetime();
        let mut spots = self.locked();

        let existing = spots
            .iter()
            .position(|s| s.call == call && s.band == band && s.mode == mode);

        let pos = match existing {
            Some(i) => {
                let spot = &mut spots[i];
                spot.ttl = lifetime;
                spot.node = node;
                if distance(spot.frequency, freq) > TOLERANCE {
                    trace!("{} moved {} -> {}", call, spot.frequency, freq);
                    let mut moved = spots.remove(i);
                    moved.frequency = freq;
                    insert_sorted(&mut spots, moved)
                } else {
                    i
                }
            }
            None => {
                let e = self.contest.enrich(call);
                let spot = Spot {
                    call: call.to_string(),
                    frequency: freq,
                    mode,
                    band,
                    node,
                    ttl: lifetime,
                    dupe: false,
                    cq_zone: e.cq_zone,
                    country: e.country,
                    prefix: e.prefix,
                };
                trace!("new spot {} on {} {} at {}", call, band, mode, freq);
                insert_sorted(&mut spots, spot)
            }
        };

        evict_neighbors(&mut spots, pos);
    }

    /// One aging step: every TTL drops by one, spots reaching zero are removed.
    pub fn age_tick(&self) {
        let mut spots = self.locked();
        let before = spots.len();
        spots.retain_mut(|s| {
            s.ttl = s.ttl.saturating_sub(1);
            s.ttl > 0
        });
        let expired = before - spots.len();
        if expired > 0 {
            debug!("aging removed {} spot(s), {} left", expired, spots.len());
        }
    }

    /// Owned copy of all spots in frequency order.
    pub fn snapshot(&self) -> Vec<Spot> {
        self.locked().clone()
    }

    /// Inserts previously saved spots, keeping frequency order.
    ///
    /// Entries with no TTL left are skipped, TTLs above the lifetime are capped,
    /// and entries clashing with a spot already present (same call/band/mode or
    /// within tolerance) give way to it. Returns the number inserted.
    pub fn restore(&self, entries: Vec<Spot>) -> usize {
        let lifetime = self.lifetime();
        let mut spots = self.locked();
        let mut inserted = 0;
        for mut entry in entries {
            if entry.ttl == 0 {
                continue;
            }
            entry.ttl = entry.ttl.min(lifetime);

            if spots
                .iter()
                .any(|s| s.call == entry.call && s.band == entry.band && s.mode == entry.mode)
            {
                trace!("restore: {} already present", entry.call);
                continue;
            }
            let at = spots.partition_point(|s| s.frequency < entry.frequency);
            let clash_below = at > 0 && distance(spots[at - 1].frequency, entry.frequency) < TOLERANCE;
            let clash_above = at < spots.len() && distance(spots[at].frequency, entry.frequency) < TOLERANCE;
            if clash_below || clash_above {
                trace!("restore: {} collides with a live spot", entry.call);
                continue;
            }
            spots.insert(at, entry);
            inserted += 1;
        }
        inserted
    }

    /// Returns true exactly once per store; used to restore saved state only once.
    pub(crate) fn claim_restore(&self) -> bool {
        !self.restored.swap(true, Ordering::SeqCst)
    }

    /// Runs `f` on every spot in frequency order while holding the lock.
    pub(crate) fn visit_mut<F: FnMut(&mut Spot)>(&self, mut f: F) {
        let mut spots = self.locked();
        for s in spots.iter_mut() {
            f(s);
        }
    }
}

/// Inserts before the first spot with an equal or higher frequency.
fn insert_sorted(spots: &mut Vec<Spot>, spot: Spot) -> usize {
    let at = spots.partition_point(|s| s.frequency < spot.frequency);
    spots.insert(at, spot);
    at
}

/// Drops the neighbors of `spots[pos]` that are within tolerance of it.
fn evict_neighbors(spots: &mut Vec<Spot>, mut pos: usize) {
    let freq = spots[pos].frequency;

    while pos > 0 && distance(spots[pos - 1].frequency, freq) < TOLERANCE {
        let gone = spots.remove(pos - 1);
        debug!("{} at {} replaced by {}", gone.call, gone.frequency, spots[pos - 1].call);
        pos -= 1;
    }
    while pos + 1 < spots.len() && distance(spots[pos + 1].frequency, freq) < TOLERANCE {
        let gone = spots.remove(pos + 1);
        debug!("{} at {} replaced by {}", gone.call, gone.frequency, spots[pos].call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::IaruBandPlan;
    use crate::contest::PrefixTable;
    use crate::contest::MemoryLog;
    use crate::model::{Band, Mode, NO_NODE};

    fn store() -> SpotStore {
        SpotStore::new(
            DEFAULT_LIFETIME,
            Arc::new(IaruBandPlan::new()),
            Arc::new(Contest::casual()),
        )
    }

    fn freqs(store: &SpotStore) -> Vec<Frequency> {
        store.snapshot().iter().map(|s| s.frequency).collect()
    }

    #[test]
    fn first_spot_gets_band_mode_and_fresh_ttl() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);

        let spots = store.snapshot();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].band, Band::M20);
        assert_eq!(spots[0].mode, Mode::Cw);
        assert_eq!(spots[0].ttl, DEFAULT_LIFETIME);
        assert_eq!(spots[0].node, NO_NODE);
    }

    #[test]
    fn out_of_band_spots_are_ignored() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_500_000, NO_NODE);
        store.add_or_refresh("W1ABC", 50_313_000, NO_NODE);
        store.add_or_refresh("", 14_025_000, NO_NODE);
        assert!(store.is_empty());
    }

    #[test]
    fn refresh_within_tolerance_keeps_frequency_and_resets_ttl() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        for _ in 0..10 {
            store.age_tick();
        }
        store.add_or_refresh("W1ABC", 14_025_050, 'B');

        let spots = store.snapshot();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].frequency, 14_025_000);
        assert_eq!(spots[0].ttl, DEFAULT_LIFETIME);
        assert_eq!(spots[0].node, 'B');
    }

    #[test]
    fn refresh_beyond_tolerance_moves_and_resorts() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_010_000, NO_NODE);
        store.add_or_refresh("K3LR", 14_020_000, NO_NODE);
        store.add_or_refresh("W1ABC", 14_030_000, NO_NODE);

        let spots = store.snapshot();
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].call, "K3LR");
        assert_eq!(spots[1].call, "W1ABC");
        assert_eq!(spots[1].frequency, 14_030_000);
    }

    #[test]
    fn move_onto_neighbor_evicts_the_neighbor() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_010_000, NO_NODE);
        store.add_or_refresh("K3LR", 14_020_000, NO_NODE);
        store.add_or_refresh("W1ABC", 14_020_050, 'B');

        let spots = store.snapshot();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].call, "W1ABC");
        assert_eq!(spots[0].frequency, 14_020_050);
    }

    #[test]
    fn lifetime_change_applies_to_later_spots_only() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_010_000, NO_NODE);
        store.set_lifetime(60);
        assert_eq!(store.lifetime(), 60);
        store.add_or_refresh("K3LR", 14_020_000, NO_NODE);

        let spots = store.snapshot();
        assert_eq!(spots[0].ttl, DEFAULT_LIFETIME);
        assert_eq!(spots[1].ttl, 60);

        store.add_or_refresh("W1ABC", 14_010_000, NO_NODE);
        assert_eq!(store.snapshot()[0].ttl, 60);

        store.set_lifetime(0);
        assert_eq!(store.lifetime(), 1);
    }

    #[test]
    fn same_call_on_other_mode_is_a_separate_spot() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        store.add_or_refresh("W1ABC", 14_250_000, NO_NODE);
        store.add_or_refresh("W1ABC", 7_025_000, NO_NODE);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn new_spot_evicts_close_neighbor() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        store.add_or_refresh("W2XYZ", 14_025_080, NO_NODE);

        let spots = store.snapshot();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].call, "W2XYZ");
    }

    #[test]
    fn eviction_hits_both_sides_but_spares_exact_tolerance() {
        let store = store();
        store.add_or_refresh("AA1A", 14_025_000, NO_NODE);
        store.add_or_refresh("BB1B", 14_025_200, NO_NODE);
        store.add_or_refresh("CC1C", 14_024_900, NO_NODE);
        assert_eq!(store.len(), 3);

        store.add_or_refresh("DD1D", 14_025_100, NO_NODE);
        // 100 Hz away from both AA1A and BB1B: not closer than tolerance
        assert_eq!(freqs(&store), vec![14_024_900, 14_025_000, 14_025_100, 14_025_200]);

        store.add_or_refresh("EE1E", 14_025_050, NO_NODE);
        let calls: Vec<String> = store.snapshot().into_iter().map(|s| s.call).collect();
        assert_eq!(calls, vec!["CC1C", "EE1E", "BB1B"]);
    }

    #[test]
    fn equal_frequency_replaces_existing_spot() {
        let store = store();
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        store.add_or_refresh("W2XYZ", 14_025_000, NO_NODE);
        let spots = store.snapshot();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].call, "W2XYZ");
    }

    #[test]
    fn aging_decays_and_removes_at_zero() {
        let store = SpotStore::new(5, Arc::new(IaruBandPlan::new()), Arc::new(Contest::casual()));
        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        for _ in 0..3 {
            store.age_tick();
        }
        assert_eq!(store.snapshot()[0].ttl, 2);
        store.age_tick();
        store.age_tick();
        assert!(store.is_empty());
    }

    #[test]
    fn new_spots_carry_country_data() {
        let mut table = PrefixTable::new();
        table.add_country("K", 5, &["W"]);
        let contest = Contest::new(Arc::new(table), Arc::new(MemoryLog::new()));
        let store = SpotStore::new(DEFAULT_LIFETIME, Arc::new(IaruBandPlan::new()), Arc::new(contest));

        store.add_or_refresh("W1ABC", 14_025_000, NO_NODE);
        store.add_or_refresh("JA1ZZZ", 14_030_000, NO_NODE);
        let spots = store.snapshot();
        assert_eq!((spots[0].cq_zone, spots[0].country, spots[0].prefix.as_str()), (5, 1, "K"));
        assert_eq!((spots[1].cq_zone, spots[1].country, spots[1].prefix.as_str()), (0, 0, ""));
    }

    #[test]
    fn restore_keeps_order_and_respects_live_spots() {
        let store = store();
        store.add_or_refresh("LIVE", 14_030_000, NO_NODE);

        let mut a = store.snapshot()[0].clone();
        a.call = "OLD1".into();
        a.frequency = 14_010_000;
        a.ttl = 5000;
        let mut b = a.clone();
        b.call = "OLD2".into();
        b.frequency = 14_030_040;
        let mut c = a.clone();
        c.call = "OLD3".into();
        c.frequency = 14_020_000;
        c.ttl = 0;

        assert_eq!(store.restore(vec![b, a, c]), 1);
        let spots = store.snapshot();
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].call, "OLD1");
        assert_eq!(spots[0].ttl, DEFAULT_LIFETIME);
        assert_eq!(spots[1].call, "LIVE");
    }

    #[test]
    fn restore_is_claimed_once() {
        let store = store();
        assert!(store.claim_restore());
        assert!(!store.claim_restore());
    }
}
