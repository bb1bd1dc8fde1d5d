//! Render scheduler: producers report invalidation intents (`RenderDelta`)
//! via `mark`; `consume` merges the queue into a single frame decision.
//!
//! Merge semantics:
//! - Any `Full` in the queue wins outright.
//! - Multiple `Scroll` deltas coalesce into one: the earliest observed
//!   `old_top` and the latest `new_top`.
//! - `Scroll` takes precedence over a bare `StatusOnly`.
//!
//! A scroll whose magnitude exceeds `SCROLL_SHIFT_MAX_ROWS` escalates to
//! `Full` in `effective`: beyond that point repainting every entering row
//! costs about as much as a full repaint, without the scroll-region
//! complexity paying for itself.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDelta {
    /// Full content repaint: new file, search jump, resize, or any scroll
    /// too large for the shift fast path.
    Full,
    /// The viewport moved from `old_top` to `new_top` (screen rows, i.e. the
    /// count of rows scrolled, not byte offsets).
    Scroll { old_top: usize, new_top: usize },
    /// Only the status/prompt line changed (message posted, prompt typed into).
    StatusOnly,
}

#[derive(Debug, Default)]
pub struct RenderScheduler {
    pending: Vec<RenderDelta>,
    metrics: RenderDeltaMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub semantic: RenderDelta,
    pub effective: RenderDelta,
}

#[derive(Debug, Default)]
struct RenderDeltaMetrics {
    full: std::sync::atomic::AtomicU64,
    scroll: std::sync::atomic::AtomicU64,
    status_only: std::sync::atomic::AtomicU64,
    collapsed_scroll: std::sync::atomic::AtomicU64,
    semantic_frames: std::sync::atomic::AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDeltaMetricsSnapshot {
    pub full: u64,
    pub scroll: u64,
    pub status_only: u64,
    pub collapsed_scroll: u64,
    pub semantic_frames: u64,
}

impl RenderDeltaMetrics {
    fn snapshot(&self) -> RenderDeltaMetricsSnapshot {
        use std::sync::atomic::Ordering::Relaxed;
        RenderDeltaMetricsSnapshot {
            full: self.full.load(Relaxed),
            scroll: self.scroll.load(Relaxed),
            status_only: self.status_only.load(Relaxed),
            collapsed_scroll: self.collapsed_scroll.load(Relaxed),
            semantic_frames: self.semantic_frames.load(Relaxed),
        }
    }

    fn incr_semantic(&self, delta: &RenderDelta) {
        use std::sync::atomic::Ordering::Relaxed;
        match delta {
            RenderDelta::Full => self.full.fetch_add(1, Relaxed),
            RenderDelta::Scroll { .. } => self.scroll.fetch_add(1, Relaxed),
            RenderDelta::StatusOnly => self.status_only.fetch_add(1, Relaxed),
        };
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scrolls larger than this many rows escalate to a full repaint.
    pub const SCROLL_SHIFT_MAX_ROWS: usize = 20;

    pub fn metrics_snapshot(&self) -> RenderDeltaMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn mark(&mut self, delta: RenderDelta) {
        tracing::trace!(target: "render.scheduler", ?delta, "render_mark");
        self.pending.push(delta);
    }

    pub fn mark_status(&mut self) {
        self.mark(RenderDelta::StatusOnly);
    }

    pub fn consume(&mut self) -> Option<Decision> {
        if self.pending.is_empty() {
            return None;
        }
        let merged = self.collapse();
        self.pending.clear();
        self.metrics.incr_semantic(&merged);
        self.metrics
            .semantic_frames
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let effective = match merged {
            RenderDelta::Scroll { old_top, new_top } => {
                if new_top.abs_diff(old_top) <= Self::SCROLL_SHIFT_MAX_ROWS {
                    merged
                } else {
                    RenderDelta::Full
                }
            }
            other => other,
        };
        Some(Decision {
            semantic: merged,
            effective,
        })
    }

    fn collapse(&self) -> RenderDelta {
        if self.pending.iter().any(|d| matches!(d, RenderDelta::Full)) {
            return RenderDelta::Full;
        }
        let mut have_status = false;
        let mut scroll_old: Option<usize> = None;
        let mut scroll_new: Option<usize> = None;
        let mut scroll_events = 0usize;
        for d in &self.pending {
            match d {
                RenderDelta::Full => return RenderDelta::Full,
                RenderDelta::StatusOnly => have_status = true,
                RenderDelta::Scroll { old_top, new_top } => {
                    scroll_events += 1;
                    if scroll_old.is_none() {
                        scroll_old = Some(*old_top);
                    }
                    scroll_new = Some(*new_top);
                }
            }
        }
        if let (Some(old_top), Some(new_top)) = (scroll_old, scroll_new) {
            if scroll_events > 1 {
                self.metrics
                    .collapsed_scroll
                    .fetch_add((scroll_events - 1) as u64, std::sync::atomic::Ordering::Relaxed);
            }
            return RenderDelta::Scroll { old_top, new_top };
        }
        if have_status {
            return RenderDelta::StatusOnly;
        }
        RenderDelta::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_overrides_all() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::StatusOnly);
        s.mark(RenderDelta::Full);
        assert_eq!(s.collapse(), RenderDelta::Full);
    }

    #[test]
    fn scroll_precedence_over_status() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::StatusOnly);
        s.mark(RenderDelta::Scroll {
            old_top: 0,
            new_top: 3,
        });
        assert_eq!(
            s.collapse(),
            RenderDelta::Scroll {
                old_top: 0,
                new_top: 3
            }
        );
    }

    #[test]
    fn multiple_scrolls_merge_to_first_and_last() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Scroll {
            old_top: 0,
            new_top: 1,
        });
        s.mark(RenderDelta::Scroll {
            old_top: 1,
            new_top: 5,
        });
        let d = s.consume().unwrap();
        assert_eq!(
            d.semantic,
            RenderDelta::Scroll {
                old_top: 0,
                new_top: 5
            }
        );
        assert_eq!(s.metrics_snapshot().collapsed_scroll, 1);
    }

    #[test]
    fn large_scroll_escalates_to_full_effective() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Scroll {
            old_top: 0,
            new_top: 500,
        });
        let d = s.consume().unwrap();
        assert_eq!(
            d.semantic,
            RenderDelta::Scroll {
                old_top: 0,
                new_top: 500
            }
        );
        assert_eq!(d.effective, RenderDelta::Full);
    }

    #[test]
    fn small_scroll_stays_effective_scroll() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Scroll {
            old_top: 10,
            new_top: 15,
        });
        let d = s.consume().unwrap();
        assert_eq!(d.effective, d.semantic);
    }

    #[test]
    fn empty_queue_yields_no_decision() {
        let mut s = RenderScheduler::new();
        assert!(s.consume().is_none());
    }
}
