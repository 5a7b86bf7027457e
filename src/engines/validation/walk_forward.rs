use crate::config::WindowSpec;
use crate::error::Result;
use crate::ml::signals::MetaSample;
use serde::{Deserialize, Serialize};

/// Bar-index boundaries of one walk-forward fold; ranges are half-open.
///
/// `train_end < embargo_end <= test_start < test_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    pub window_id: usize,
    pub train_start: usize,
    pub train_end: usize,
    pub embargo_end: usize,
    pub test_start: usize,
    pub test_end: usize,
}

impl WalkForwardWindow {
    /// Training samples whose label resolves at or after this bar are purged.
    pub fn purge_boundary(&self, embargo_size: usize) -> usize {
        self.test_start.saturating_sub(embargo_size)
    }
}

/// Samples assigned to one window.
#[derive(Debug, Clone)]
pub struct WindowSplit<'a> {
    pub window: WalkForwardWindow,
    pub train: Vec<&'a MetaSample>,
    pub test: Vec<&'a MetaSample>,
    /// Training samples dropped because their label overlapped the test region.
    pub purged: usize,
}

pub struct WalkForwardSplitter {
    spec: WindowSpec,
}

impl WalkForwardSplitter {
    pub fn new(spec: WindowSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    /// Bars needed for one complete window.
    pub fn min_span(&self) -> usize {
        self.spec.train_size + self.spec.embargo_size + self.spec.test_size
    }

    /// Full windows over bars `[start, end)`, sliding by `step_size`.
    pub fn windows(&self, start: usize, end: usize) -> Vec<WalkForwardWindow> {
        let mut windows = Vec::new();
        let mut train_start = start;

        while train_start + self.min_span() <= end {
            let train_end = train_start + self.spec.train_size;
            let embargo_end = train_end + self.spec.embargo_size;
            let test_start = embargo_end;
            windows.push(WalkForwardWindow {
                window_id: windows.len(),
                train_start,
                train_end,
                embargo_end,
                test_start,
                test_end: test_start + self.spec.test_size,
            });
            train_start += self.spec.step_size;
        }

        windows
    }

    /// Windows spanning the bars covered by `samples` (sorted by index).
    pub fn windows_for(&self, samples: &[MetaSample]) -> Vec<WalkForwardWindow> {
        match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => self.windows(first.index, last.index + 1),
            _ => Vec::new(),
        }
    }

    /// Assigns samples to the window and purges overlapping training labels.
    pub fn split<'a>(&self, samples: &'a [MetaSample], window: &WalkForwardWindow) -> WindowSplit<'a> {
        let boundary = window.purge_boundary(self.spec.embargo_size);
        let mut train = Vec::new();
        let mut test = Vec::new();
        let mut purged = 0;

        for sample in samples {
            if (window.train_start..window.train_end).contains(&sample.index) {
                if sample.exit_index >= boundary {
                    purged += 1;
                } else {
                    train.push(sample);
                }
            } else if (window.test_start..window.test_end).contains(&sample.index) {
                test.push(sample);
            }
        }

        WindowSplit {
            window: *window,
            train,
            test,
            purged,
        }
    }
}
