use crate::errors::BandmapError;
use crate::filter::FilterView;
use csv::Writer;
use std::path::Path;

/// Writes the filtered view as CSV, one row per spot in frequency order.
pub fn write_view(view: &FilterView, out_path: &Path) -> Result<(), BandmapError> {
    let mut wtr = Writer::from_path(out_path)
        .map_err(|e| BandmapError::IO(format!("open out csv: {}", e)))?;

    wtr.write_record([
        "frequency_khz", "call", "band", "mode", "node", "ttl", "dupe",
        "cq_zone", "country", "prefix",
    ]).map_err(|e| BandmapError::IO(format!("csv write header: {}", e)))?;

    for s in view.spots() {
        wtr.write_record(&[
            format!("{:.1}", s.frequency as f64 / 1000.0),
            s.call.clone(),
            s.band.to_string(),
            s.mode.to_string(),
            s.node.to_string(),
            s.ttl.to_string(),
            s.dupe.to_string(),
            s.cq_zone.to_string(),
            s.country.to_string(),
            s.prefix.clone(),
        ]).map_err(|e| BandmapError::IO(format!("csv write row: {}", e)))?;
    }

    wtr.flush().map_err(|e| BandmapError::IO(format!("csv flush: {}", e)))?;
    Ok(())
}
