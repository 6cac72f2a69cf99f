use serde::{Deserialize, Serialize};
use std::fmt;

/// Frequency in Hz, exactly as received.
pub type Frequency = u32;

/// Spots closer than this (in Hz) are treated as the same signal.
pub const TOLERANCE: Frequency = 100;

/// Highest frequency accepted into the bandmap (HF only).
pub const MAX_HF_FREQUENCY: Frequency = 30_000_000;

/// Node id used when a spot was not relayed by a networked logging instance.
pub const NO_NODE: char = ' ';

#[inline]
pub fn distance(a: Frequency, b: Frequency) -> Frequency {
    a.abs_diff(b)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Cw,
    Ssb,
    Digi,
}

impl Mode {
    /// Integer used in the state file.
    pub fn index(self) -> u8 {
        match self {
            Mode::Cw => 0,
            Mode::Ssb => 1,
            Mode::Digi => 2,
        }
    }

    pub fn from_index(i: u8) -> Option<Mode> {
        match i {
            0 => Some(Mode::Cw),
            1 => Some(Mode::Ssb),
            2 => Some(Mode::Digi),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Mode> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CW" => Some(Mode::Cw),
            "SSB" | "PH" | "PHONE" => Some(Mode::Ssb),
            "DIGI" | "RTTY" | "DIG" => Some(Mode::Digi),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Cw => "CW",
            Mode::Ssb => "SSB",
            Mode::Digi => "DIGI",
        };
        f.write_str(s)
    }
}

/// HF amateur bands, in the order used for the persisted band index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    M160,
    M80,
    M60,
    M40,
    M30,
    M20,
    M17,
    M15,
    M12,
    M10,
}

impl Band {
    pub const ALL: [Band; 10] = [
        Band::M160,
        Band::M80,
        Band::M60,
        Band::M40,
        Band::M30,
        Band::M20,
        Band::M17,
        Band::M15,
        Band::M12,
        Band::M10,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(i: u8) -> Option<Band> {
        Band::ALL.get(i as usize).copied()
    }

    pub fn meters(self) -> u16 {
        match self {
            Band::M160 => 160,
            Band::M80 => 80,
            Band::M60 => 60,
            Band::M40 => 40,
            Band::M30 => 30,
            Band::M20 => 20,
            Band::M17 => 17,
            Band::M15 => 15,
            Band::M12 => 12,
            Band::M10 => 10,
        }
    }

    pub fn from_meters(m: u16) -> Option<Band> {
        Band::ALL.iter().copied().find(|b| b.meters() == m)
    }

    /// Bands outside the usual contest allocations.
    pub fn is_warc(self) -> bool {
        matches!(self, Band::M60 | Band::M30 | Band::M17 | Band::M12)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.meters())
    }
}

/// One DX spot as held by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    pub call: String,
    pub frequency: Frequency,
    pub mode: Mode,
    pub band: Band,
    pub node: char,
    pub ttl: u32,
    pub dupe: bool,
    pub cq_zone: i32,
    pub country: i32,
    pub prefix: String,
}
