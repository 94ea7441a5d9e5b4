//! Timing and transition planning for multi-image scenes.
//!
//! A scene's audio duration is partitioned evenly across its images; the last
//! segment absorbs the rounding remainder so the segments always sum exactly
//! to the probed duration. Cross-fade offsets are derived from the cumulative
//! segment boundaries.

use crate::error::{MediaError, MediaResult};

/// Minimum seconds an image should stay on screen. Scenes with more images
/// than `duration / MIN_SEGMENT_SECS` only use the leading images.
pub const MIN_SEGMENT_SECS: f64 = 3.0;

/// Fixed cross-fade duration in seconds.
pub const TRANSITION_SECS: f64 = 1.0;

/// How many of a scene's images to actually show, given the audio duration.
///
/// At least one, at most `image_count`, capped so no image gets less than
/// [`MIN_SEGMENT_SECS`] of screen time.
pub fn select_image_slots(image_count: usize, duration: f64) -> usize {
    let slots = (duration / MIN_SEGMENT_SECS).floor() as usize;
    slots.clamp(1, image_count.max(1))
}

/// Per-image segment durations for one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingPlan {
    segments: Vec<f64>,
    total: f64,
}

impl TimingPlan {
    /// Partition `total` seconds across `image_count` images.
    ///
    /// All segments but the last equal `total / image_count`; the last equals
    /// `total` minus the sum of the preceding ones, so the plan sums exactly
    /// to `total` with no floating-point drift.
    pub fn new(image_count: usize, total: f64) -> MediaResult<Self> {
        if image_count == 0 {
            return Err(MediaError::render("Timing plan needs at least one image", None, None));
        }
        if total <= 0.0 {
            return Err(MediaError::render(
                format!("Timing plan needs a positive duration, got {}", total),
                None,
                None,
            ));
        }

        let even = total / image_count as f64;
        let mut segments = Vec::with_capacity(image_count);
        let mut acc = 0.0;
        for i in 0..image_count {
            let d = if i == image_count - 1 { total - acc } else { even };
            segments.push(d);
            acc += d;
        }

        Ok(Self { segments, total })
    }

    /// Segment durations in image order.
    pub fn segments(&self) -> &[f64] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the trivial single-segment plan.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total planned duration.
    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Cross-fade offsets for a scene with two or more images.
///
/// Transition `i` (between image `i` and image `i + 1`) starts at the
/// cumulative end of segment `i` minus the fade duration, clamped to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    offsets: Vec<f64>,
}

impl TransitionPlan {
    /// Derive the transition chain from a timing plan.
    pub fn from_timing(timing: &TimingPlan) -> Self {
        let segments = timing.segments();
        let mut offsets = Vec::new();
        let mut cumulative = 0.0;
        for segment in &segments[..segments.len().saturating_sub(1)] {
            cumulative += segment;
            offsets.push((cumulative - TRANSITION_SECS).max(0.0));
        }
        Self { offsets }
    }

    /// Offsets in timeline order, one per transition.
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Number of transitions (`image_count - 1`).
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when the scene has a single image and no transitions.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
