//! Render path metrics: counts which repaint strategy actually ran each
//! frame, distinct from `scheduler::RenderDeltaMetrics` (which counts what
//! producers *asked for*). Useful for a `-P` style debug overlay or just for
//! tests asserting the scroll-shift fast path actually engaged.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderPathMetrics {
    pub full_frames: AtomicU64,
    pub scroll_frames: AtomicU64,
    pub status_only_frames: AtomicU64,
    pub scroll_degraded_full: AtomicU64,
    pub rows_repainted: AtomicU64,
    pub rows_reused: AtomicU64,
    pub resize_invalidations: AtomicU64,
    pub status_skipped: AtomicU64,
    pub last_full_render_ns: AtomicU64,
    pub last_partial_render_ns: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPathMetricsSnapshot {
    pub full_frames: u64,
    pub scroll_frames: u64,
    pub status_only_frames: u64,
    pub scroll_degraded_full: u64,
    pub rows_repainted: u64,
    pub rows_reused: u64,
    pub resize_invalidations: u64,
    pub status_skipped: u64,
    pub last_full_render_ns: u64,
    pub last_partial_render_ns: u64,
}

impl RenderPathMetrics {
    pub fn snapshot(&self) -> RenderPathMetricsSnapshot {
        RenderPathMetricsSnapshot {
            full_frames: self.full_frames.load(Ordering::Relaxed),
            scroll_frames: self.scroll_frames.load(Ordering::Relaxed),
            status_only_frames: self.status_only_frames.load(Ordering::Relaxed),
            scroll_degraded_full: self.scroll_degraded_full.load(Ordering::Relaxed),
            rows_repainted: self.rows_repainted.load(Ordering::Relaxed),
            rows_reused: self.rows_reused.load(Ordering::Relaxed),
            resize_invalidations: self.resize_invalidations.load(Ordering::Relaxed),
            status_skipped: self.status_skipped.load(Ordering::Relaxed),
            last_full_render_ns: self.last_full_render_ns.load(Ordering::Relaxed),
            last_partial_render_ns: self.last_partial_render_ns.load(Ordering::Relaxed),
        }
    }
}
