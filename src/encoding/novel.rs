//! Fallback encoding for categories unseen during training.
//!
//! Every table carries exactly one [`Level::Novel`] entry. Its value comes
//! from the global statistics alone and never from trained-level values:
//! - shrinkage: the global mean, i.e. the fully pooled estimate;
//! - WOE: the prior log-odds `ln(total_events / total_nonevents)`. When
//!   either total is zero the Haldane-corrected
//!   `ln((E + 0.5) / (M + 0.5))` keeps the value finite.

use crate::aggregate::GlobalStatistics;
use crate::category::Level;
use crate::encoding::woe::HALDANE_CORRECTION;
use crate::table::EncodingEntry;

/// Fallback value for the shrinkage path.
pub fn smoothing_fallback(global: &GlobalStatistics) -> f64 {
    global.global_mean
}

/// Fallback value for the WOE path.
pub fn woe_fallback(global: &GlobalStatistics) -> f64 {
    let (events, nonevents) = (global.total_events, global.total_nonevents);
    if events > 0.0 && nonevents > 0.0 {
        (events / nonevents).ln()
    } else {
        ((events + HALDANE_CORRECTION) / (nonevents + HALDANE_CORRECTION)).ln()
    }
}

/// The synthetic novel-level entry.
pub fn novel_entry(value: f64) -> EncodingEntry {
    EncodingEntry::scalar(Level::Novel, value)
}
