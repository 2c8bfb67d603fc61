//! Overlay coordinator: the Idle/Hovering/Selected state machine behind the
//! transient selection UI (popover, comment form).
//!
//! The coordinator owns no DOM wrappers and performs no highlighting; it
//! tracks one active region's geometry and phase, re-deriving the rectangle
//! from the live range on resize. When a hover-out grace expiry drops it back
//! to `Idle`, the host is expected to retract the standing highlight through
//! the observer.

use crate::dom::Document;
use crate::geometry::GeometrySource;
use crate::observer::{SelectedRegion, SelectionOutcome};
use crate::timer::{Millis, TimerQueue, TimerToken};

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Hover-out grace: how long the pointer may stay outside the overlay
    /// before it is dismissed. Pointer re-entry cancels the pending expiry.
    pub hover_grace_ms: Millis,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig { hover_grace_ms: 400 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Idle,
    Hovering,
    Selected,
}

pub struct OverlayCoordinator {
    config: OverlayConfig,
    phase: OverlayPhase,
    region: Option<SelectedRegion>,
    grace: Option<TimerToken>,
}

impl OverlayCoordinator {
    pub fn new(config: OverlayConfig) -> Self {
        OverlayCoordinator {
            config,
            phase: OverlayPhase::Idle,
            region: None,
            grace: None,
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    /// Geometry of the active region, for UI placement. `None` when `Idle`.
    pub fn region(&self) -> Option<&SelectedRegion> {
        self.region.as_ref()
    }

    /// Feed a debounce settlement from the selection observer.
    pub fn apply_outcome(&mut self, outcome: &SelectionOutcome, timers: &mut TimerQueue) {
        match outcome {
            SelectionOutcome::Selected(region) => {
                self.cancel_grace(timers);
                self.phase = OverlayPhase::Selected;
                self.region = Some(region.clone());
            }
            SelectionOutcome::Cleared => {
                // The observer only reports Cleared when no hover is active.
                self.cancel_grace(timers);
                self.go_idle();
            }
            // Hover is holding the overlay open, or the operation failed and
            // prior state stands.
            SelectionOutcome::HoverHeld | SelectionOutcome::Failed => {}
        }
    }

    /// Pointer entered the rendered overlay. Cancels any pending hover-out.
    pub fn pointer_enter(&mut self, timers: &mut TimerQueue) {
        self.cancel_grace(timers);
        self.phase = OverlayPhase::Hovering;
    }

    /// Pointer left the overlay; arm the hover-out grace timer.
    pub fn pointer_leave(&mut self, timers: &mut TimerQueue, now: Millis) {
        if self.phase != OverlayPhase::Hovering {
            return;
        }
        self.cancel_grace(timers);
        self.grace = Some(timers.schedule(now, self.config.hover_grace_ms));
    }

    /// Offer a fired timer token. Returns `true` when the hover-out grace
    /// expired and the overlay went `Idle` (the host should then retract the
    /// standing highlight).
    pub fn handle_timer(&mut self, token: TimerToken) -> bool {
        if self.grace != Some(token) {
            return false;
        }
        self.grace = None;
        if self.phase != OverlayPhase::Hovering {
            return false;
        }
        self.go_idle();
        true
    }

    /// Layout changed: recompute the rectangle and scroll offset from the
    /// still-live range, without re-anchoring or re-highlighting. If the
    /// range no longer resolves, the overlay falls back to `Idle`.
    pub fn window_resized(
        &mut self,
        doc: &Document,
        geometry: &dyn GeometrySource,
        timers: &mut TimerQueue,
    ) {
        if self.phase == OverlayPhase::Idle {
            return;
        }
        let refreshed = self
            .region
            .as_ref()
            .filter(|region| region.range.is_live(doc))
            .and_then(|region| geometry.range_rect(doc, &region.range));
        match refreshed {
            Some(rect) => {
                if let Some(region) = self.region.as_mut() {
                    region.rect = rect;
                    region.scroll = geometry.scroll_offset();
                }
            }
            None => {
                self.cancel_grace(timers);
                self.go_idle();
            }
        }
    }

    fn go_idle(&mut self) {
        self.phase = OverlayPhase::Idle;
        self.region = None;
    }

    fn cancel_grace(&mut self, timers: &mut TimerQueue) {
        if let Some(token) = self.grace.take() {
            timers.cancel(token);
        }
    }
}
