//! Live bandmap of DX cluster spots.
//!
//! Spots enter a frequency-ordered [`store::SpotStore`], decay with every
//! aging tick, and are copied into a [`filter::FilterView`] per render cycle.
//! [`window::WindowSelector`] picks the part of the view shown around the
//! operator's frequency.

pub mod bands;
pub mod cli;
pub mod cluster;
pub mod contest;
pub mod csv_out;
pub mod display;
pub mod errors;
pub mod filter;
pub mod model;
pub mod persist;
pub mod store;
pub mod window;

pub use errors::BandmapError;
pub use filter::{BandmapConfig, FilterView, Toggle, Tuning};
pub use model::{Band, Frequency, Mode, Spot, TOLERANCE};
pub use store::SpotStore;
pub use window::{Row, Window, WindowSelector};
