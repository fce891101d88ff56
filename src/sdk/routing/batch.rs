use std::ops::Range;

/// Largest request shape a provider accepts in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_sources: usize,
    pub max_targets: usize,
    /// Cap on sources x targets per call.
    pub max_pairs: usize,
}

impl BatchLimits {
    /// Only the pair product is capped.
    pub fn pairs(max_pairs: usize) -> Self {
        Self {
            max_sources: max_pairs,
            max_targets: max_pairs,
            max_pairs,
        }
    }

    pub fn admits(&self, sources: usize, targets: usize) -> bool {
        sources <= self.max_sources && targets <= self.max_targets && sources * targets <= self.max_pairs
    }
}

/// One provider call: a window of sources against a window of targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWindow {
    pub sources: Range<usize>,
    pub targets: Range<usize>,
}

/// Tiles `sources x targets` into windows that each satisfy `limits`.
///
/// Source windows are as tall as the limits allow; the target window is then
/// narrowed so the pair product fits. Windows are disjoint and cover every cell.
pub fn plan_batches(sources: usize, targets: usize, limits: BatchLimits) -> Vec<BatchWindow> {
    if sources == 0 || targets == 0 {
        return Vec::new();
    }
    let max_pairs = limits.max_pairs.max(1);
    let source_window = limits.max_sources.clamp(1, max_pairs);

    let mut windows = Vec::new();
    let mut s_start = 0;
    while s_start < sources {
        let s_end = (s_start + source_window).min(sources);
        let s_len = s_end - s_start;
        let target_window = limits.max_targets.min(max_pairs / s_len).max(1);

        let mut t_start = 0;
        while t_start < targets {
            let t_end = (t_start + target_window).min(targets);
            windows.push(BatchWindow {
                sources: s_start..s_end,
                targets: t_start..t_end,
            });
            t_start = t_end;
        }
        s_start = s_end;
    }
    windows
}
