//! Input coverage and trust for a prediction.

use market_pulse_core::{AggregatedSnapshot, DataQuality, EventAnalysis, Resolution};

/// Context series shorter than this count as missing.
const MIN_CONTEXT_POINTS: usize = 10;
const BASE_RELIABILITY: f64 = 0.85;

/// Scores how complete and trustworthy the snapshot behind a prediction is.
#[must_use]
pub fn assess_data_quality(snapshot: &AggregatedSnapshot, events: &EventAnalysis) -> DataQuality {
    let mut completeness = 1.0;
    let mut reliability = BASE_RELIABILITY;

    for resolution in [Resolution::OneMinute, Resolution::FiveMinutes] {
        if snapshot.context_len(resolution) < MIN_CONTEXT_POINTS {
            completeness -= 0.1;
        }
    }

    if snapshot.order_book.is_none() {
        completeness -= 0.1;
        reliability -= 0.05;
    }

    if events.total_events > 0 && events.average_severity > 2.0 {
        reliability += 0.05;
    }

    DataQuality {
        completeness: f64::clamp(completeness, 0.0, 1.0),
        reliability: f64::clamp(reliability, 0.0, 1.0),
    }
}
