//! The header search widget.
//!
//! `SearchWidget` is the single owner of [`WidgetState`]. Input handlers
//! (`focus`, `input`, `clear`, `pointer_down`, ...) run synchronously and
//! never wait on the network; debounce timers and fetches run as spawned tasks
//! that report back through the widget's event channel. The owner feeds those
//! events to [`SearchWidget::handle_event`], typically via
//! [`SearchWidget::next_event`] or [`SearchWidget::process_pending`].

use crate::binder::{Bounds, Key, Navigator, Point};
use crate::model::results::normalize_capped;
use crate::model::state::{QueryController, WidgetState};
use crate::orchestrator::{DispatchOutcome, FetchOrchestrator, SequenceToken};
use crate::views::dropdown::{self, DropdownView};
use core_types::EntityKind;
use core_types::config::{LeadingEdge, SearchConfig};
use core_types::routes::search_route;
use directory_client::Lookup;
use scheduler::{ChangeContext, Debouncer, TriggerPlan, plan_change};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const MAX_EVENTS_PER_TICK: usize = 64;

/// Work reported back to the widget by its timers and fetches.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    DebounceElapsed { generation: u64 },
    DispatchSettled(DispatchOutcome),
}

/// Result of feeding one event to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A trailing search was dispatched.
    Dispatched(SequenceToken),
    /// A settled dispatch replaced the visible results.
    Fresh(SequenceToken),
    /// A settled dispatch was superseded and dropped.
    Stale(SequenceToken),
    /// A timer fire that had already been cancelled or replaced.
    Ignored,
}

pub struct SearchWidget {
    controller: QueryController,
    orchestrator: FetchOrchestrator,
    debouncer: Debouncer,
    leading: LeadingEdge,
    page_size: usize,
    /// Token of the dispatch whose outcome the widget is waiting for.
    awaiting: Option<SequenceToken>,
    bounds: Bounds,
    navigator: Arc<dyn Navigator>,
    events_tx: mpsc::UnboundedSender<WidgetEvent>,
    events_rx: mpsc::UnboundedReceiver<WidgetEvent>,
}

impl SearchWidget {
    pub fn mount(
        lookup: Arc<dyn Lookup>,
        navigator: Arc<dyn Navigator>,
        bounds: Bounds,
        cfg: &SearchConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller: QueryController::new(),
            orchestrator: FetchOrchestrator::new(lookup, cfg.page_size),
            debouncer: Debouncer::new(Duration::from_millis(cfg.debounce_ms)),
            leading: cfg.leading_edge,
            page_size: cfg.page_size as usize,
            awaiting: None,
            bounds,
            navigator,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> &WidgetState {
        self.controller.state()
    }

    pub fn view(&self) -> DropdownView {
        dropdown::render(self.state())
    }

    pub fn input_focused(&self) -> bool {
        self.controller.input_focused()
    }

    /// Whether a trailing fire is armed or a current dispatch is outstanding.
    pub fn is_busy(&self) -> bool {
        self.debouncer.is_armed() || self.awaiting.is_some()
    }

    /// Input gained focus.
    pub fn focus(&mut self) {
        self.set_focused(true);
    }

    pub fn set_focused(&mut self, focused: bool) {
        if self.controller.set_focused(focused) {
            if !focused {
                self.drop_pending_work();
            }
            self.on_change();
        }
    }

    /// Text field contents changed.
    pub fn input(&mut self, text: impl Into<String>) {
        if self.controller.set_text(text) {
            self.on_change();
        }
    }

    /// Clear button: close and reset, keeping keyboard focus in the input.
    pub fn clear(&mut self) {
        self.controller.clear();
        self.drop_pending_work();
    }

    /// Pointer-down anywhere on the page. Outside the widget bounds it
    /// blurs the input and dismisses an open widget; returns whether it
    /// closed anything.
    pub fn pointer_down(&mut self, at: Point) -> bool {
        if self.bounds.contains(at) {
            return false;
        }
        if !self.state().is_open {
            self.controller.blur();
            return false;
        }
        debug!(x = at.x, y = at.y, "pointer down outside search; closing");
        self.set_focused(false);
        true
    }

    pub fn key(&mut self, key: Key) {
        match key {
            Key::Escape => {
                if self.controller.close() {
                    self.drop_pending_work();
                }
            }
        }
    }

    /// Navigate to the detail route of the `index`-th hit in `kind`'s
    /// section, then close. Returns the route, or `None` when no such hit.
    pub fn select(&mut self, kind: EntityKind, index: usize) -> Option<String> {
        let route = self
            .state()
            .last_results
            .section(kind)
            .get(index)
            .map(core_types::DisplayHit::route)?;
        self.navigator.navigate(&route);
        self.dismiss();
        Some(route)
    }

    /// "View all results" is offered while loading or when anything matched.
    pub fn can_view_all(&self) -> bool {
        let state = self.state();
        state.is_open
            && !state.query_text.is_empty()
            && (state.is_loading || !state.last_results.is_empty())
    }

    /// Navigate to the full search page for the current text, then close.
    pub fn view_all(&mut self) -> Option<String> {
        if !self.can_view_all() {
            return None;
        }
        let route = search_route(&self.state().query_text);
        self.navigator.navigate(&route);
        self.dismiss();
        Some(route)
    }

    pub fn handle_event(&mut self, event: WidgetEvent) -> Applied {
        match event {
            WidgetEvent::DebounceElapsed { generation } => {
                if !self.debouncer.accept_fire(generation) {
                    return Applied::Ignored;
                }
                let state = self.state();
                if !state.is_open || state.query_text.is_empty() {
                    if self.awaiting.is_none() {
                        self.controller.state_mut().is_loading = false;
                    }
                    return Applied::Ignored;
                }
                Applied::Dispatched(self.dispatch_current())
            }
            WidgetEvent::DispatchSettled(outcome) => self.apply(outcome),
        }
    }

    /// Handle whatever events are already queued, without waiting.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while handled < MAX_EVENTS_PER_TICK {
            let Ok(event) = self.events_rx.try_recv() else {
                break;
            };
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next event from a timer or fetch.
    pub async fn next_event(&mut self) -> Option<WidgetEvent> {
        self.events_rx.recv().await
    }

    /// Handle events until no trailing fire is armed and the current dispatch
    /// has settled. A lookup that never resolves keeps this waiting.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            match self.events_rx.recv().await {
                Some(event) => {
                    self.handle_event(event);
                }
                None => break,
            }
        }
    }

    /// Tear down: cancel the timer and make every in-flight dispatch stale.
    pub fn unmount(mut self) {
        self.debouncer.cancel();
        self.orchestrator.invalidate();
        debug!("search widget unmounted");
    }

    fn on_change(&mut self) {
        let state = self.controller.state();
        let ctx = ChangeContext {
            is_open: state.is_open,
            has_text: !state.query_text.is_empty(),
            armed: self.debouncer.is_armed(),
        };

        match plan_change(ctx, self.leading) {
            TriggerPlan::Disarm => {
                self.debouncer.cancel();
                if ctx.is_open {
                    // emptied while open: nothing to show for an empty query
                    self.drop_pending_work();
                    self.controller.state_mut().last_results = Default::default();
                }
            }
            TriggerPlan::Search { immediate } => {
                if immediate {
                    self.dispatch_current();
                } else {
                    // only the trailing fire will search this text
                    self.orchestrator.invalidate();
                    self.awaiting = None;
                    self.controller.state_mut().is_loading = true;
                }
                let tx = self.events_tx.clone();
                self.debouncer.arm(move |generation| {
                    let _ = tx.send(WidgetEvent::DebounceElapsed { generation });
                });
            }
        }
    }

    fn dispatch_current(&mut self) -> SequenceToken {
        let query = self.state().query_text.clone();
        let tx = self.events_tx.clone();
        let token = self.orchestrator.dispatch(query, move |outcome| {
            let _ = tx.send(WidgetEvent::DispatchSettled(outcome));
        });
        self.awaiting = Some(token);
        self.controller.state_mut().is_loading = true;
        token
    }

    fn apply(&mut self, outcome: DispatchOutcome) -> Applied {
        let token = outcome.token;
        if !self.orchestrator.is_current(token) {
            debug!(token = token.value(), query = %outcome.query, "dropping stale search results");
            if self.awaiting.is_none() && !self.debouncer.is_armed() {
                self.controller.state_mut().is_loading = false;
            }
            return Applied::Stale(token);
        }

        let results = normalize_capped(&outcome.raw, self.page_size);
        debug!(
            token = token.value(),
            query = %outcome.query,
            total = results.total(),
            "applying search results"
        );
        let state = self.controller.state_mut();
        state.last_results = results;
        state.is_loading = false;
        self.awaiting = None;
        Applied::Fresh(token)
    }

    /// Close after a navigation; the input loses focus.
    fn dismiss(&mut self) {
        self.controller.close();
        self.controller.blur();
        self.drop_pending_work();
    }

    fn drop_pending_work(&mut self) {
        self.debouncer.cancel();
        self.orchestrator.invalidate();
        self.awaiting = None;
        self.controller.state_mut().is_loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::RouteHistory;
    use async_trait::async_trait;
    use directory_client::{LookupError, LookupRequest};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted lookup: per-query delay and payloads, records every call.
    #[derive(Default)]
    struct Scripted {
        delays: HashMap<String, Duration>,
        payloads: HashMap<(String, EntityKind), Value>,
        failing: Vec<EntityKind>,
        calls: Mutex<Vec<(EntityKind, String)>>,
    }

    impl Scripted {
        fn delay(mut self, query: &str, ms: u64) -> Self {
            self.delays.insert(query.into(), Duration::from_millis(ms));
            self
        }

        fn payload(mut self, query: &str, kind: EntityKind, payload: Value) -> Self {
            self.payloads.insert((query.into(), kind), payload);
            self
        }

        fn fail(mut self, kind: EntityKind) -> Self {
            self.failing.push(kind);
            self
        }

        /// Queries dispatched, one entry per dispatch.
        fn dispatched(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(kind, _)| *kind == EntityKind::Organization)
                .map(|(_, q)| q.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Lookup for Scripted {
        async fn lookup(&self, req: &LookupRequest) -> Result<Value, LookupError> {
            self.calls.lock().unwrap().push((req.kind, req.query.clone()));
            let delay = self
                .delays
                .get(&req.query)
                .copied()
                .unwrap_or(Duration::from_millis(10));
            tokio::time::sleep(delay).await;
            if self.failing.contains(&req.kind) {
                return Err(LookupError::Status(500));
            }
            Ok(self
                .payloads
                .get(&(req.query.clone(), req.kind))
                .cloned()
                .unwrap_or_else(|| json!([])))
        }
    }

    fn mount(lookup: Arc<Scripted>, cfg: SearchConfig) -> (SearchWidget, Arc<RouteHistory>) {
        let history = Arc::new(RouteHistory::new());
        let widget = SearchWidget::mount(
            lookup,
            history.clone(),
            Bounds::new(0.0, 0.0, 400.0, 300.0),
            &cfg,
        );
        (widget, history)
    }

    fn acme() -> Scripted {
        Scripted::default()
            .payload(
                "Acme",
                EntityKind::Organization,
                json!([
                    { "id": 1, "name": "Acme Robotics", "slug": "acme-robotics" },
                    { "id": 2, "name": "Acme Foods", "slug": "acme-foods" },
                ]),
            )
            .payload("Acme", EntityKind::Investor, json!([]))
            .payload(
                "Acme",
                EntityKind::Person,
                json!([{ "id": 3, "full_name": "Ada Acme" }]),
            )
    }

    async fn type_burst(widget: &mut SearchWidget, text: &str, gap_ms: u64) {
        for end in 1..=text.len() {
            widget.input(&text[..end]);
            tokio::time::sleep(Duration::from_millis(gap_ms)).await;
            widget.process_pending();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_dispatches_leading_and_trailing_only() {
        let lookup = Arc::new(acme());
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.focus();
        type_burst(&mut widget, "Acme", 50).await;
        widget.settle().await;

        assert_eq!(lookup.dispatched(), vec!["A", "Acme"]);
        assert_eq!(widget.state().last_results.total(), 3);
        assert!(!widget.state().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn text_awaiting_trailing_fire_shows_searching() {
        let lookup = Arc::new(Scripted::default().payload(
            "Ac",
            EntityKind::Organization,
            json!([{ "id": 9, "name": "Acorn", "slug": "acorn" }]),
        ));
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.focus();
        widget.input("A");
        tokio::time::sleep(Duration::from_millis(50)).await;
        widget.process_pending();
        assert_eq!(widget.view(), DropdownView::NoResults { query: "A".into() });

        widget.input("Ac");
        tokio::time::sleep(Duration::from_millis(20)).await;
        widget.process_pending();
        assert!(widget.state().is_loading);
        assert_eq!(widget.view(), DropdownView::Searching);
        assert!(widget.can_view_all());

        widget.settle().await;
        assert_eq!(lookup.dispatched(), vec!["A", "Ac"]);
        assert_eq!(widget.state().last_results.total(), 1);
        assert!(!widget.state().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_dispatch_landing_during_burst_stays_searching() {
        let lookup = Arc::new(
            acme()
                .delay("A", 100)
                .payload("A", EntityKind::Organization, json!([{ "name": "Alpha" }])),
        );
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.focus();
        widget.input("A");
        tokio::time::sleep(Duration::from_millis(20)).await;
        widget.input("Acme");

        // "A" settles while the trailing fire for "Acme" is still armed
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(widget.process_pending(), 1);
        assert!(widget.state().last_results.is_empty());
        assert_eq!(widget.view(), DropdownView::Searching);

        widget.settle().await;
        assert_eq!(lookup.dispatched(), vec!["A", "Acme"]);
        assert_eq!(widget.state().last_results.organizations[0].title, "Acme Robotics");
    }

    #[tokio::test(start_paused = true)]
    async fn every_change_policy_leads_on_each_keystroke() {
        let lookup = Arc::new(acme());
        let cfg = SearchConfig {
            leading_edge: LeadingEdge::EveryChange,
            ..SearchConfig::default()
        };
        let (mut widget, _) = mount(lookup.clone(), cfg);

        widget.focus();
        type_burst(&mut widget, "Acme", 50).await;
        widget.settle().await;

        assert_eq!(lookup.dispatched(), vec!["A", "Ac", "Acm", "Acme", "Acme"]);
        assert_eq!(widget.state().last_results.total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn late_stale_result_never_overwrites_newer() {
        let lookup = Arc::new(
            acme()
                .delay("A", 1_000)
                .delay("Acme", 10)
                .payload("A", EntityKind::Organization, json!([{ "name": "Stale Co" }])),
        );
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.focus();
        type_burst(&mut widget, "Acme", 20).await;
        widget.settle().await;
        assert_eq!(widget.state().last_results.organizations[0].title, "Acme Robotics");

        // let the slow "A" dispatch land
        let event = widget.next_event().await.expect("late outcome");
        assert!(matches!(widget.handle_event(event), Applied::Stale(_)));
        assert_eq!(widget.state().last_results.organizations[0].title, "Acme Robotics");
        assert_eq!(widget.state().last_results.total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_matches_reach_no_results() {
        let lookup = Arc::new(Scripted::default());
        let (mut widget, _) = mount(lookup, SearchConfig::default());

        widget.focus();
        widget.input("zzz");
        assert_eq!(widget.view(), DropdownView::Searching);
        widget.settle().await;
        assert_eq!(widget.view(), DropdownView::NoResults { query: "zzz".into() });
    }

    #[tokio::test(start_paused = true)]
    async fn all_sources_failing_is_no_results_not_an_error() {
        let lookup = Arc::new(
            Scripted::default()
                .fail(EntityKind::Organization)
                .fail(EntityKind::Investor)
                .fail(EntityKind::Person),
        );
        let (mut widget, _) = mount(lookup, SearchConfig::default());

        widget.focus();
        widget.input("acme");
        widget.settle().await;
        assert_eq!(widget.view(), DropdownView::NoResults { query: "acme".into() });
    }

    #[tokio::test(start_paused = true)]
    async fn clear_during_flight_leaves_idle() {
        let lookup = Arc::new(acme().delay("Acme", 500));
        let (mut widget, _) = mount(lookup, SearchConfig::default());

        widget.focus();
        widget.input("Acme");
        assert!(widget.state().is_loading);
        widget.clear();
        assert!(widget.state().is_idle());
        assert!(widget.input_focused());
        assert!(!widget.is_busy());

        tokio::time::sleep(Duration::from_secs(1)).await;
        widget.process_pending();
        assert!(widget.state().is_idle());
        assert_eq!(widget.view(), DropdownView::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_after_clear_reopens() {
        let lookup = Arc::new(acme());
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.focus();
        widget.input("x");
        widget.clear();
        widget.input("Acme");
        assert!(widget.state().is_open);
        widget.settle().await;
        assert_eq!(widget.state().last_results.total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn outside_click_dismisses_and_inside_does_not() {
        let lookup = Arc::new(acme().delay("Acme", 200));
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.focus();
        widget.input("Acme");
        assert!(!widget.pointer_down(Point::new(10.0, 10.0)));
        assert!(widget.state().is_open);

        assert!(widget.pointer_down(Point::new(900.0, 10.0)));
        assert!(widget.state().is_idle());
        assert!(!widget.input_focused());

        tokio::time::sleep(Duration::from_secs(1)).await;
        widget.process_pending();
        assert!(widget.state().is_idle());
        assert_eq!(lookup.dispatched(), vec!["Acme"]);
    }

    #[tokio::test(start_paused = true)]
    async fn outside_click_while_closed_still_blurs() {
        let lookup = Arc::new(acme());
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.focus();
        widget.input("Acme");
        widget.key(Key::Escape);
        assert!(widget.input_focused());

        assert!(!widget.pointer_down(Point::new(900.0, 10.0)));
        assert!(!widget.input_focused());

        widget.input("Acme Foods");
        assert!(!widget.state().is_open);
        assert_eq!(widget.view(), DropdownView::Hidden);
        tokio::time::sleep(Duration::from_secs(1)).await;
        widget.process_pending();
        assert_eq!(lookup.dispatched(), vec!["Acme"]);
    }

    #[tokio::test(start_paused = true)]
    async fn emptying_text_cancels_trailing_fire() {
        let lookup = Arc::new(acme());
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.focus();
        widget.input("A");
        widget.input("");
        assert!(!widget.is_busy());
        tokio::time::sleep(Duration::from_secs(1)).await;
        widget.process_pending();

        assert_eq!(lookup.dispatched(), vec!["A"]);
        assert!(widget.state().is_open);
        assert!(widget.state().last_results.is_empty());
        assert_eq!(widget.view(), DropdownView::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_with_existing_text_searches_immediately() {
        let lookup = Arc::new(acme());
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());

        widget.input("Acme");
        assert!(!widget.state().is_open);
        assert!(lookup.dispatched().is_empty());

        widget.focus();
        assert!(widget.state().is_loading);
        widget.settle().await;
        assert_eq!(widget.state().last_results.total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_a_hit_navigates_and_resets() {
        let lookup = Arc::new(acme());
        let (mut widget, history) = mount(lookup, SearchConfig::default());

        widget.focus();
        widget.input("Acme");
        widget.settle().await;

        assert_eq!(widget.select(EntityKind::Investor, 0), None);
        let route = widget.select(EntityKind::Person, 0);
        // the person has no slug
        assert_eq!(route.as_deref(), Some("/people/"));
        assert_eq!(history.routes(), vec!["/people/"]);
        assert!(widget.state().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn view_all_requires_results_or_loading() {
        let lookup = Arc::new(acme().delay("a b", 50));
        let (mut widget, history) = mount(lookup, SearchConfig::default());

        widget.focus();
        assert_eq!(widget.view_all(), None);

        widget.input("a b");
        assert!(widget.can_view_all());
        widget.settle().await;
        // settled with nothing found
        assert_eq!(widget.view_all(), None);

        widget.input("Acme");
        widget.settle().await;
        assert_eq!(widget.view_all().as_deref(), Some("/search?q=Acme"));
        assert_eq!(history.last().as_deref(), Some("/search?q=Acme"));
        assert!(widget.state().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn escape_closes_but_keeps_focus() {
        let lookup = Arc::new(acme());
        let (mut widget, _) = mount(lookup, SearchConfig::default());

        widget.focus();
        widget.input("Acme");
        widget.key(Key::Escape);
        assert!(widget.state().is_idle());
        assert!(widget.input_focused());
        assert!(!widget.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_releases_timers_and_tokens() {
        let lookup = Arc::new(acme().delay("Acme", 100));
        let (mut widget, _) = mount(lookup.clone(), SearchConfig::default());
        widget.focus();
        widget.input("Acme");
        widget.unmount();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(lookup.dispatched(), vec!["Acme"]);
    }
}
