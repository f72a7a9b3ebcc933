//! Render plans
//!
//! A plan is rebuilt for every compositor call and discarded afterwards.
//! It holds one lane per clip (window plus delay), the mute windows for the
//! background and the duck settings. Renderers only read it.

use log::debug;
use serde::{Deserialize, Serialize};

use super::clip::ClipDescriptor;
use crate::config::CompositorConfig;
use crate::error::{DubmixError, Result};

/// What to do when two clip windows overlap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Fail the render before any external work
    #[default]
    Reject,
    /// Union the windows and sum the overlapping clips
    Mix,
}

/// Closed time interval `[start, end]` in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Zero-length windows mute nothing
    pub fn is_empty(&self) -> bool {
        !(self.end > self.start)
    }

    pub fn contains(&self, t: f64) -> bool {
        !self.is_empty() && t >= self.start && t <= self.end
    }

    /// Windows that only touch at an endpoint do not overlap
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start < other.end
            && other.start < self.end
    }
}

/// Placement of one clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipLane {
    /// Position of the clip in the submitted list
    pub index: usize,
    pub window: TimeWindow,
}

impl ClipLane {
    pub fn delay_secs(&self) -> f64 {
        self.window.start
    }

    /// Delay in whole milliseconds (truncated)
    pub fn delay_ms(&self) -> u64 {
        (self.window.start * 1000.0) as u64
    }

    /// First sample at `sample_rate` whose time is inside the window
    ///
    /// Matches the `t >= start` test used for muting, so the clip never
    /// starts on a sample where the background still sounds.
    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        let rate = sample_rate as f64;
        let start = self.window.start;
        let mut n = (start * rate).ceil() as usize;
        if n > 0 && (n - 1) as f64 / rate >= start {
            n -= 1;
        }
        if (n as f64 / rate) < start {
            n += 1;
        }
        n
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub lanes: Vec<ClipLane>,
    pub ducking: bool,
    /// Background gain inside duck windows
    pub duck_gain: f32,
}

impl RenderPlan {
    /// Build a plan from clips and their probed durations
    ///
    /// Durations that are negative or not finite count as 0.0.
    pub fn build(
        clips: &[ClipDescriptor],
        durations: &[f64],
        config: &CompositorConfig,
    ) -> Result<Self> {
        if clips.len() != durations.len() {
            return Err(DubmixError::render(format!(
                "{} clips but {} durations",
                clips.len(),
                durations.len()
            )));
        }

        let mut lanes = Vec::with_capacity(clips.len());
        for (index, (clip, &duration)) in clips.iter().zip(durations).enumerate() {
            clip.validate(index)?;
            let duration = if duration.is_finite() && duration > 0.0 {
                duration
            } else {
                0.0
            };
            lanes.push(ClipLane {
                index,
                window: TimeWindow::new(clip.start_time, clip.start_time + duration),
            });
        }

        if config.overlap_policy == OverlapPolicy::Reject {
            check_overlaps(&lanes)?;
        }

        let plan = Self {
            lanes,
            ducking: config.ducking,
            duck_gain: config.duck_gain(),
        };
        debug!(
            "Render plan: {} lanes, {} mute windows, ducking {}",
            plan.lanes.len(),
            plan.mute_windows().count(),
            plan.ducking
        );
        Ok(plan)
    }

    /// Windows in which the background is silenced
    pub fn mute_windows(&self) -> impl Iterator<Item = &TimeWindow> {
        self.lanes
            .iter()
            .map(|lane| &lane.window)
            .filter(|w| !w.is_empty())
    }

    pub fn is_muted(&self, t: f64) -> bool {
        self.mute_windows().any(|w| w.contains(t))
    }

    /// Windows in which the background is ducked (empty when ducking is off)
    pub fn duck_windows(&self) -> impl Iterator<Item = &TimeWindow> {
        self.mute_windows().filter(move |_| self.ducking)
    }

    /// Gain applied to the background at time `t`
    ///
    /// Duck windows coincide with mute windows, so inside a window the
    /// background is silent either way and outside it is untouched.
    pub fn background_gain(&self, t: f64) -> f32 {
        if self.is_muted(t) {
            0.0
        } else {
            1.0
        }
    }
}

/// Sort by start and compare neighbours; any overlap shows up between some
/// pair of neighbours once the windows are ordered.
fn check_overlaps(lanes: &[ClipLane]) -> Result<()> {
    let mut ordered: Vec<&ClipLane> = lanes.iter().filter(|l| !l.window.is_empty()).collect();
    ordered.sort_by(|a, b| a.window.start.total_cmp(&b.window.start));
    for pair in ordered.windows(2) {
        if pair[0].window.overlaps(&pair[1].window) {
            let (first, second) = if pair[0].index < pair[1].index {
                (pair[0].index, pair[1].index)
            } else {
                (pair[1].index, pair[0].index)
            };
            return Err(DubmixError::OverlappingClips { first, second });
        }
    }
    Ok(())
}
