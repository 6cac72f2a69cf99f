use crate::contest::Contest;
use crate::filter::BandmapConfig;
use crate::model::{Frequency, Spot};
use crate::window::Row;

/// Room for the call in one spot column.
pub const SPOT_CALL_WIDTH: usize = 11;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Age {
    New,
    Normal,
    Old,
}

pub fn age_of(ttl: u32, lifetime: u32) -> Age {
    let normal = lifetime as u64 * 95 / 100;
    let old = lifetime as u64 * 2 / 3;
    let ttl = ttl as u64;
    if ttl > normal {
        Age::New
    } else if ttl > old {
        Age::Normal
    } else {
        Age::Old
    }
}

/// Cuts `s` to `n` characters, marking a cut with "..".
pub fn truncate(s: &str, n: usize) -> String {
    if s.chars().count() > n {
        let mut out: String = s.chars().take(n.saturating_sub(2)).collect();
        out.push_str("..");
        out
    } else {
        s.to_string()
    }
}

/// Call as shown in the map: QTC flag appended, dupes in lower case.
pub fn call_label(spot: &Spot, cfg: &BandmapConfig, contest: &Contest) -> String {
    let mut label = match contest.qtc() {
        Some(q) => {
            let total = q.counts(&spot.call).total;
            match q.flag(&spot.call) {
                None if total == 0 => truncate(&spot.call, SPOT_CALL_WIDTH),
                flag => format!(
                    "{} {}",
                    truncate(&spot.call, SPOT_CALL_WIDTH - 2),
                    flag.unwrap_or(' ')
                ),
            }
        }
        None => spot.call.clone(),
    };
    if spot.dupe && cfg.show_dupes {
        label = label.to_ascii_lowercase();
    }
    label
}

fn node_mark(spot: &Spot, own_node: char) -> char {
    if spot.node == own_node { '*' } else { spot.node }
}

fn khz(freq: Frequency) -> f64 {
    freq as f64 / 1000.0
}

/// One spot cell: frequency in kHz, node, multiplier mark and call.
pub fn format_spot(spot: &Spot, cfg: &BandmapConfig, contest: &Contest, own_node: char) -> String {
    let multi = if contest.is_multiplier(spot) { 'M' } else { ' ' };
    format!(
        "{:7.1}{}{} {:<12}",
        khz(spot.frequency),
        node_mark(spot, own_node),
        multi,
        call_label(spot, cfg, contest)
    )
}

pub fn format_marker(center: Frequency) -> String {
    format!("{:7.1}   {}", khz(center), "============")
}

pub fn format_row(row: &Row<'_>, cfg: &BandmapConfig, contest: &Contest, own_node: char) -> String {
    match row {
        Row::Spot(s) | Row::OnCenter(s) => format_spot(s, cfg, contest, own_node),
        Row::Marker(f) => format_marker(*f),
    }
}
