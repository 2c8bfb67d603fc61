//! Selection observer: debounced bridge from raw selection events to the
//! anchor codec, highlight engine, and registry.
//!
//! The host forwards every selection-change (and pointer-up, where selection
//! change does not fire reliably during drag-select) into
//! [`SelectionObserver::selection_changed`]. Nothing happens until the
//! trailing debounce elapses; only the settled selection is processed. A
//! pending debounce timer is always cancelled before a new one is scheduled,
//! so a stale callback can never fire after the state has moved on.
//!
//! Anchoring failures abort only the operation in progress: they are logged
//! and the previously-installed highlights stay untouched.

use crate::anchor::{self, RawRange};
use crate::dom::{Document, LiveRange, NodeId};
use crate::geometry::{GeometrySource, Point, Rect};
use crate::highlight::{HighlightHandle, highlight_range};
use crate::registry::HighlightRegistry;
use crate::timer::{Millis, TimerQueue, TimerToken};

#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Trailing debounce for selection settling.
    pub debounce_ms: Millis,
    /// Class applied to the standing selection highlight.
    pub highlight_class: String,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        ObserverConfig {
            debounce_ms: 500,
            highlight_class: "highlight".to_string(),
        }
    }
}

/// A snapshot of the platform selection: zero or more live ranges.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub ranges: Vec<LiveRange>,
}

impl Selection {
    pub fn none() -> Self {
        Selection::default()
    }

    pub fn single(range: LiveRange) -> Self {
        Selection {
            ranges: vec![range],
        }
    }
}

/// Geometry and anchors of a settled, highlighted selection, consumed by the
/// overlay coordinator and the comment UI layer.
#[derive(Debug, Clone)]
pub struct SelectedRegion {
    /// Durable anchors, one per selection range, ready for persistence.
    pub raw_ranges: Vec<RawRange>,
    /// Post-highlight live range spanning the whole highlighted region.
    pub range: LiveRange,
    pub rect: Rect,
    pub scroll: Point,
}

/// What a debounce settlement concluded.
#[derive(Debug)]
pub enum SelectionOutcome {
    /// A qualifying selection was anchored and highlighted.
    Selected(SelectedRegion),
    /// No usable selection; any standing highlight was cleared.
    Cleared,
    /// No visible selection, but an active hover is keeping the overlay (and
    /// the standing highlight) alive.
    HoverHeld,
    /// Anchoring failed; logged, prior highlight state untouched.
    Failed,
}

pub struct SelectionObserver {
    config: ObserverConfig,
    root: NodeId,
    registry: HighlightRegistry,
    pending: Option<TimerToken>,
    latest: Option<Selection>,
    running: bool,
}

impl SelectionObserver {
    /// `root` scopes the observer: selections starting outside this element
    /// (page chrome, UI) are treated as no selection.
    pub fn new(root: NodeId, config: ObserverConfig) -> Self {
        SelectionObserver {
            config,
            root,
            registry: HighlightRegistry::new(),
            pending: None,
            latest: None,
            running: false,
        }
    }

    pub fn registry(&self) -> &HighlightRegistry {
        &self.registry
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Deterministic teardown: cancels any pending debounce and retracts all
    /// standing highlights. Safe to call repeatedly.
    pub fn stop(&mut self, doc: &mut Document, timers: &mut TimerQueue) {
        self.running = false;
        if let Some(token) = self.pending.take() {
            timers.cancel(token);
        }
        self.latest = None;
        self.registry.clear(doc);
    }

    /// Record a selection-change and (re)arm the debounce. The previous
    /// pending timer, if any, is cancelled first.
    pub fn selection_changed(
        &mut self,
        selection: Selection,
        timers: &mut TimerQueue,
        now: Millis,
    ) {
        if !self.running {
            return;
        }
        self.latest = Some(selection);
        if let Some(token) = self.pending.take() {
            timers.cancel(token);
        }
        self.pending = Some(timers.schedule(now, self.config.debounce_ms));
    }

    /// Pointer-up fallback for drag selections that never fire a final
    /// selection-change. Same debounce path.
    pub fn pointer_up(&mut self, selection: Selection, timers: &mut TimerQueue, now: Millis) {
        self.selection_changed(selection, timers, now);
    }

    /// Offer a fired timer token to the observer. Returns the settlement
    /// outcome when the token was this observer's pending debounce.
    pub fn handle_timer(
        &mut self,
        token: TimerToken,
        doc: &mut Document,
        geometry: &dyn GeometrySource,
        hover_active: bool,
    ) -> Option<SelectionOutcome> {
        if self.pending != Some(token) {
            return None;
        }
        self.pending = None;
        Some(self.settle(doc, geometry, hover_active))
    }

    /// Retract the standing selection highlight (hover-out expiry path).
    pub fn clear_highlights(&mut self, doc: &mut Document) {
        self.registry.clear(doc);
    }

    fn settle(
        &mut self,
        doc: &mut Document,
        geometry: &dyn GeometrySource,
        hover_active: bool,
    ) -> SelectionOutcome {
        let selection = self.latest.take().unwrap_or_default();

        if selection.ranges.is_empty() {
            return self.no_selection(doc, hover_active);
        }

        // Reject selections that start outside the annotatable region.
        let start_container = selection.ranges[0].start.node;
        if !doc.contains(self.root, start_container) {
            return self.no_selection(doc, hover_active);
        }

        let rect = selection
            .ranges
            .iter()
            .filter_map(|range| geometry.range_rect(doc, range))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        if rect.is_zero_extent() {
            return self.no_selection(doc, hover_active);
        }

        // Anchor every range first; nothing is mutated until all encode.
        let mut raw_ranges = Vec::with_capacity(selection.ranges.len());
        for range in &selection.ranges {
            match anchor::encode(doc, range) {
                Ok(raw) => raw_ranges.push(raw),
                Err(err) => {
                    log::warn!("selection could not be anchored: {err}");
                    return SelectionOutcome::Failed;
                }
            }
        }

        // Re-decode each anchor and highlight the post-normalization range.
        let mut handles: Vec<HighlightHandle> = Vec::with_capacity(raw_ranges.len());
        let mut overall: Option<LiveRange> = None;
        for raw in &raw_ranges {
            let live = match anchor::decode(doc, raw) {
                Ok(live) => live,
                Err(err) => {
                    for handle in &mut handles {
                        handle.retract(doc);
                    }
                    log::warn!("anchored selection failed to re-resolve: {err}");
                    return SelectionOutcome::Failed;
                }
            };
            let handle = highlight_range(doc, &live, &self.config.highlight_class);
            if let Some(adjusted) = handle.range() {
                overall = Some(match overall {
                    None => adjusted,
                    Some(region) => LiveRange {
                        start: region.start,
                        end: adjusted.end,
                    },
                });
            }
            handles.push(handle);
        }

        let Some(range) = overall else {
            // Every range collapsed away; nothing visible to keep.
            for handle in &mut handles {
                handle.retract(doc);
            }
            return self.no_selection(doc, hover_active);
        };

        self.registry.replace_all(doc, handles);
        SelectionOutcome::Selected(SelectedRegion {
            raw_ranges,
            range,
            rect,
            scroll: geometry.scroll_offset(),
        })
    }

    fn no_selection(&mut self, doc: &mut Document, hover_active: bool) -> SelectionOutcome {
        if hover_active {
            return SelectionOutcome::HoverHeld;
        }
        self.registry.clear(doc);
        SelectionOutcome::Cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CharGridGeometry;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::parse_xhtml(
            r#"<body><nav>chrome text</nav><article id="article"><p id="text0">Hello, world.</p></article></body>"#,
        )
        .unwrap()
    }

    fn observer_for(doc: &Document) -> SelectionObserver {
        let root = doc.element_by_id("article").unwrap();
        let mut observer = SelectionObserver::new(root, ObserverConfig::default());
        observer.start();
        observer
    }

    fn settle_at(
        observer: &mut SelectionObserver,
        doc: &mut Document,
        timers: &mut TimerQueue,
        now: Millis,
    ) -> Vec<SelectionOutcome> {
        let geometry = CharGridGeometry::new(80);
        timers
            .fire_due(now)
            .into_iter()
            .filter_map(|token| observer.handle_timer(token, doc, &geometry, false))
            .collect()
    }

    fn world_selection(doc: &Document) -> Selection {
        let para = doc.element_by_id("text0").unwrap();
        let text = doc.first_text_node(para).unwrap();
        Selection::single(LiveRange::new(text, 7, text, 12))
    }

    #[test]
    fn settled_selection_is_anchored_and_highlighted() {
        let mut doc = doc();
        let mut observer = observer_for(&doc);
        let mut timers = TimerQueue::new();

        observer.selection_changed(world_selection(&doc), &mut timers, 0);
        let outcomes = settle_at(&mut observer, &mut doc, &mut timers, 500);
        assert_eq!(outcomes.len(), 1);

        match &outcomes[0] {
            SelectionOutcome::Selected(region) => {
                assert_eq!(region.raw_ranges.len(), 1);
                assert_eq!(region.raw_ranges[0].start.id, "text0");
                assert_eq!(region.raw_ranges[0].start.text_offset, 7);
                assert_eq!(region.raw_ranges[0].end.text_offset, 12);
                assert_eq!(region.range.text(&doc), "world");
            }
            other => panic!("expected Selected, got {other:?}"),
        }
        assert_eq!(observer.registry().len(), 1);
    }

    #[test]
    fn ten_rapid_events_settle_exactly_once_with_the_last_selection() {
        let mut doc = doc();
        let mut observer = observer_for(&doc);
        let mut timers = TimerQueue::new();

        let para = doc.element_by_id("text0").unwrap();
        let text = doc.first_text_node(para).unwrap();
        for i in 0..10 {
            let selection = if i < 9 {
                Selection::single(LiveRange::new(text, 0, text, 5))
            } else {
                Selection::single(LiveRange::new(text, 7, text, 12))
            };
            observer.selection_changed(selection, &mut timers, i * 40);
        }

        // Nothing settles inside the debounce window of the last event.
        assert!(settle_at(&mut observer, &mut doc, &mut timers, 500).is_empty());

        let outcomes = settle_at(&mut observer, &mut doc, &mut timers, 360 + 500);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            SelectionOutcome::Selected(region) => {
                assert_eq!(region.range.text(&doc), "world");
            }
            other => panic!("expected Selected, got {other:?}"),
        }
        // No further settlements later.
        assert!(settle_at(&mut observer, &mut doc, &mut timers, 10_000).is_empty());
    }

    #[test]
    fn empty_selection_clears_standing_highlight() {
        let mut doc = doc();
        let mut observer = observer_for(&doc);
        let mut timers = TimerQueue::new();

        observer.selection_changed(world_selection(&doc), &mut timers, 0);
        settle_at(&mut observer, &mut doc, &mut timers, 500);
        assert_eq!(observer.registry().len(), 1);

        observer.selection_changed(Selection::none(), &mut timers, 600);
        let outcomes = settle_at(&mut observer, &mut doc, &mut timers, 1_100);
        assert!(matches!(outcomes[0], SelectionOutcome::Cleared));
        assert!(observer.registry().is_empty());
        assert_eq!(doc.text_content(doc.root()), "chrome textHello, world.");
    }

    #[test]
    fn selection_outside_content_root_is_rejected() {
        let mut doc = doc();
        let mut observer = observer_for(&doc);
        let mut timers = TimerQueue::new();

        let chrome_text = doc
            .first_text_node(doc.root())
            .expect("nav text before article");
        observer.selection_changed(
            Selection::single(LiveRange::new(chrome_text, 0, chrome_text, 6)),
            &mut timers,
            0,
        );
        let outcomes = settle_at(&mut observer, &mut doc, &mut timers, 500);
        assert!(matches!(outcomes[0], SelectionOutcome::Cleared));
        assert!(observer.registry().is_empty());
    }

    #[test]
    fn caret_only_selection_is_treated_as_none() {
        let mut doc = doc();
        let mut observer = observer_for(&doc);
        let mut timers = TimerQueue::new();

        let para = doc.element_by_id("text0").unwrap();
        let text = doc.first_text_node(para).unwrap();
        observer.selection_changed(
            Selection::single(LiveRange::new(text, 3, text, 3)),
            &mut timers,
            0,
        );
        let outcomes = settle_at(&mut observer, &mut doc, &mut timers, 500);
        assert!(matches!(outcomes[0], SelectionOutcome::Cleared));
    }

    #[test]
    fn hover_holds_highlight_when_selection_vanishes() {
        let mut doc = doc();
        let mut observer = observer_for(&doc);
        let mut timers = TimerQueue::new();
        let geometry = CharGridGeometry::new(80);

        observer.selection_changed(world_selection(&doc), &mut timers, 0);
        settle_at(&mut observer, &mut doc, &mut timers, 500);

        observer.selection_changed(Selection::none(), &mut timers, 600);
        let outcomes: Vec<_> = timers
            .fire_due(1_100)
            .into_iter()
            .filter_map(|token| observer.handle_timer(token, &mut doc, &geometry, true))
            .collect();
        assert!(matches!(outcomes[0], SelectionOutcome::HoverHeld));
        assert_eq!(observer.registry().len(), 1);
    }

    #[test]
    fn anchoring_failure_leaves_prior_highlights_untouched() {
        let mut doc = Document::parse_xhtml(
            r#"<body><article id="article"><p id="text0">anchored text</p><p>bare paragraph</p></article></body>"#,
        )
        .unwrap();
        let mut observer = observer_for(&doc);
        let mut timers = TimerQueue::new();

        let good = doc.element_by_id("text0").unwrap();
        let good_text = doc.first_text_node(good).unwrap();
        observer.selection_changed(
            Selection::single(LiveRange::new(good_text, 0, good_text, 8)),
            &mut timers,
            0,
        );
        settle_at(&mut observer, &mut doc, &mut timers, 500);
        assert_eq!(observer.registry().len(), 1);

        // A document with no stable ids at all: encoding must fail.
        let mut chromeless =
            Document::parse_xhtml(r#"<body><p>no ids here</p></body>"#).unwrap();
        let root = chromeless.root();
        let mut lone = SelectionObserver::new(root, ObserverConfig::default());
        lone.start();
        let text = chromeless.first_text_node(root).unwrap();
        lone.selection_changed(
            Selection::single(LiveRange::new(text, 0, text, 5)),
            &mut timers,
            600,
        );
        let geometry = CharGridGeometry::new(80);
        let outcomes: Vec<_> = timers
            .fire_due(1_100)
            .into_iter()
            .filter_map(|token| lone.handle_timer(token, &mut chromeless, &geometry, false))
            .collect();
        assert!(matches!(outcomes[0], SelectionOutcome::Failed));
        assert!(lone.registry().is_empty());
        assert_eq!(chromeless.text_content(root), "no ids here");
    }

    #[test]
    fn stop_cancels_pending_work_and_retracts() {
        let mut doc = doc();
        let mut observer = observer_for(&doc);
        let mut timers = TimerQueue::new();

        observer.selection_changed(world_selection(&doc), &mut timers, 0);
        settle_at(&mut observer, &mut doc, &mut timers, 500);
        observer.selection_changed(world_selection(&doc), &mut timers, 600);

        observer.stop(&mut doc, &mut timers);
        assert!(observer.registry().is_empty());
        assert!(timers.is_empty());
        // Events after stop are ignored.
        observer.selection_changed(world_selection(&doc), &mut timers, 700);
        assert!(timers.is_empty());
    }
}
