use crate::model::{Band, Frequency, MAX_HF_FREQUENCY, Mode};

/// Classifies frequencies into bands and modes from configured corner frequencies.
pub trait BandPlan: Send + Sync {
    fn band_of(&self, freq: Frequency) -> Option<Band>;
    fn mode_of(&self, freq: Frequency, band: Band) -> Mode;
    /// Display center used when no rig frequency is available.
    fn center_of(&self, band: Band, mode: Mode) -> Frequency;
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    band: Band,
    lower: Frequency,
    upper: Frequency,
    cw_corner: Frequency,
    ssb_corner: Frequency,
}

const IARU_SEGMENTS: [Segment; 10] = [
    Segment { band: Band::M160, lower: 1_800_000, upper: 2_000_000, cw_corner: 1_838_000, ssb_corner: 1_840_000 },
    Segment { band: Band::M80, lower: 3_500_000, upper: 4_000_000, cw_corner: 3_580_000, ssb_corner: 3_600_000 },
    Segment { band: Band::M60, lower: 5_250_000, upper: 5_450_000, cw_corner: 5_354_000, ssb_corner: 5_354_000 },
    Segment { band: Band::M40, lower: 7_000_000, upper: 7_300_000, cw_corner: 7_040_000, ssb_corner: 7_040_000 },
    Segment { band: Band::M30, lower: 10_100_000, upper: 10_150_000, cw_corner: 10_140_000, ssb_corner: 10_150_000 },
    Segment { band: Band::M20, lower: 14_000_000, upper: 14_350_000, cw_corner: 14_070_000, ssb_corner: 14_100_000 },
    Segment { band: Band::M17, lower: 18_068_000, upper: 18_168_000, cw_corner: 18_095_000, ssb_corner: 18_110_000 },
    Segment { band: Band::M15, lower: 21_000_000, upper: 21_450_000, cw_corner: 21_070_000, ssb_corner: 21_150_000 },
    Segment { band: Band::M12, lower: 24_890_000, upper: 24_990_000, cw_corner: 24_915_000, ssb_corner: 24_930_000 },
    Segment { band: Band::M10, lower: 28_000_000, upper: 29_700_000, cw_corner: 28_070_000, ssb_corner: 28_300_000 },
];

/// Region-1 style band edges and mode corners.
#[derive(Clone, Debug, Default)]
pub struct IaruBandPlan;

impl IaruBandPlan {
    pub fn new() -> Self {
        IaruBandPlan
    }

    fn segment(&self, band: Band) -> &'static Segment {
        &IARU_SEGMENTS[band.index() as usize]
    }
}

impl BandPlan for IaruBandPlan {
    fn band_of(&self, freq: Frequency) -> Option<Band> {
        if freq > MAX_HF_FREQUENCY {
            return None;
        }
        IARU_SEGMENTS
            .iter()
            .find(|s| freq >= s.lower && freq <= s.upper)
            .map(|s| s.band)
    }

    fn mode_of(&self, freq: Frequency, band: Band) -> Mode {
        let s = self.segment(band);
        if freq <= s.cw_corner {
            Mode::Cw
        } else if freq < s.ssb_corner {
            Mode::Digi
        } else {
            Mode::Ssb
        }
    }

    fn center_of(&self, band: Band, mode: Mode) -> Frequency {
        let s = self.segment(band);
        match mode {
            Mode::Cw => (s.lower + s.cw_corner) / 2,
            Mode::Ssb => (s.ssb_corner + s.upper) / 2,
            Mode::Digi => (s.cw_corner + s.ssb_corner) / 2,
        }
    }
}
