//! Chooses which part of the filtered view fits on screen.
//!
//! The display is split into the spots below the center frequency, the center
//! itself (a marker line, or the spot sitting on it) and the spots above.
//! Both halves get the same room; if one side has fewer spots than its half,
//! the other side gets the rest, so the grid stays as full as possible.

use crate::filter::FilterView;
use crate::model::{Frequency, Spot, TOLERANCE};
use serde::Serialize;
use std::ops::Range;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: usize,
    /// Index of the first spot that is not below the center.
    pub below: usize,
    pub on_center: bool,
    pub stop: usize,
    /// Whether a center line is drawn at all (rig frequency known).
    pub marker: bool,
    pub center: Frequency,
}

/// One cell of the rendered window, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Row<'a> {
    Spot(&'a Spot),
    OnCenter(&'a Spot),
    Marker(Frequency),
}

impl Window {
    pub fn below_range(&self) -> Range<usize> {
        self.start..self.below
    }

    pub fn center_index(&self) -> Option<usize> {
        self.on_center.then_some(self.below)
    }

    pub fn above_range(&self) -> Range<usize> {
        (self.below + usize::from(self.on_center))..self.stop
    }

    pub fn rows<'a>(&self, spots: &'a [Spot]) -> Vec<Row<'a>> {
        let mut rows = Vec::new();
        rows.extend(spots[self.below_range()].iter().map(Row::Spot));
        if self.marker {
            match self.center_index() {
                Some(i) => rows.push(Row::OnCenter(&spots[i])),
                None => rows.push(Row::Marker(self.center)),
            }
        }
        rows.extend(spots[self.above_range()].iter().map(Row::Spot));
        rows
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSelector {
    capacity: usize,
}

impl WindowSelector {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Capacity of a grid of `rows` lines by `columns` spot columns.
    pub fn for_grid(rows: usize, columns: usize) -> Self {
        Self::new(rows.saturating_mul(columns))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn select(&self, view: &FilterView, center: Frequency, live_center: bool) -> Window {
        self.select_spots(view.spots(), center, live_center)
    }

    /// `spots` must be ordered by frequency.
    pub fn select_spots(&self, spots: &[Spot], center: Frequency, live_center: bool) -> Window {
        let n = self.capacity;
        let len = spots.len();
        if n == 0 {
            return Window {
                marker: false,
                center,
                ..Window::default()
            };
        }

        let low = center.saturating_sub(TOLERANCE);
        let high = center.saturating_add(TOLERANCE);

        let below = if center >= TOLERANCE {
            spots.partition_point(|s| s.frequency <= low)
        } else {
            0
        };
        let mut on_center = below < len && spots[below].frequency <= high;
        let above = len - below - usize::from(on_center);

        let max_below = if above < (n - 1) / 2 { n - above - 1 } else { n / 2 };
        let start = below.saturating_sub(max_below);
        let mut stop = len.min(start + n - (1 - usize::from(on_center)));

        if !live_center {
            if on_center {
                on_center = false;
            } else {
                stop += 1;
            }
            stop = stop.min(len);
        }

        Window {
            start,
            below,
            on_center,
            stop,
            marker: live_center,
            center,
        }
    }
}
