use serde::Serialize;

use crate::video::asset::MediaAsset;
use crate::video::error::PipelineError;

/// Shortest display time handed to the encoder; zero or negative durations are rejected by it.
pub const MIN_ENTRY_SECONDS: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub asset: MediaAsset,
    pub start_offset: f64,
    pub duration: f64,
}

impl TimelineEntry {
    pub fn end(&self) -> f64 {
        self.start_offset + self.duration
    }
}

/// Contiguous image schedule covering the whole narration.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_duration(&self) -> f64 {
        self.entries.last().map(TimelineEntry::end).unwrap_or(0.0)
    }

    /// All entries but the final one, which the concat list writes without a duration.
    pub fn split_last(&self) -> Option<(&TimelineEntry, &[TimelineEntry])> {
        self.entries.split_last()
    }
}

/// Spread `total_duration` evenly over the first `max_images` images.
pub fn plan_timeline(
    total_duration: f64,
    images: &[MediaAsset],
    max_images: usize,
) -> Result<Timeline, PipelineError> {
    if images.is_empty() {
        return Err(PipelineError::NoImages);
    }

    let count = images.len().min(max_images.max(1));
    let selected = &images[..count];

    let total = if total_duration.is_finite() && total_duration > 0.0 {
        total_duration
    } else {
        MIN_ENTRY_SECONDS * count as f64
    };
    let per_image = total / count as f64;

    let entries = selected
        .iter()
        .enumerate()
        .map(|(index, asset)| {
            let start_offset = per_image * index as f64;
            let duration = if index + 1 == count {
                // Absorb rounding so the schedule ends exactly on the narration
                total - start_offset
            } else {
                per_image
            };
            TimelineEntry {
                asset: asset.clone(),
                start_offset,
                duration,
            }
        })
        .collect();

    Ok(Timeline { entries })
}
