//! Event loop that runs one controller against a server
//!
//! The session feeds events to the controller and carries out the effects it
//! returns. Fetches run as tasks on the current runtime and post their
//! response bodies back through a channel; responses are applied in arrival
//! order. A failed request is logged and otherwise ignored, so whatever the
//! controller last showed (usually the loading placeholder) stays up.

use crate::client::Fetcher;
use crate::error::Result;
use benchview_core::event::ControllerEvent;
use benchview_core::timeline::{TimelineController, TimelineInteraction};
use benchview_core::{Controller, DashboardConfig, Effect, Endpoint, Event, Notice, UrlHistory};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Everything a session produced, in the shape a page would show it
#[derive(Debug, Clone, Serialize)]
pub struct Page<V> {
    /// Latest rendered view
    pub view: Option<V>,
    /// Inline messages, oldest first
    pub notices: Vec<Notice>,
    /// URLs the page asked to navigate to
    pub navigations: Vec<String>,
    pub history: UrlHistory,
    /// Requests that failed in transport or decoding
    pub failed_requests: usize,
}

impl<V> Default for Page<V> {
    fn default() -> Self {
        Self {
            view: None,
            notices: Vec::new(),
            navigations: Vec::new(),
            history: UrlHistory::new(),
            failed_requests: 0,
        }
    }
}

impl<V> Page<V> {
    /// The most recent notice, if any
    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

struct Response {
    endpoint: Endpoint,
    body: Result<String>,
}

/// Runs one controller
pub struct Session<C: Controller, F: Fetcher> {
    controller: C,
    fetcher: F,
    config: DashboardConfig,
    tx: mpsc::UnboundedSender<Response>,
    rx: mpsc::UnboundedReceiver<Response>,
    in_flight: usize,
    page: Page<C::View>,
}

impl<C: Controller, F: Fetcher> Session<C, F> {
    pub fn new(controller: C, fetcher: F, config: DashboardConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller,
            fetcher,
            config,
            tx,
            rx,
            in_flight: 0,
            page: Page::default(),
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn page(&self) -> &Page<C::View> {
        &self.page
    }

    pub fn into_page(self) -> Page<C::View> {
        self.page
    }

    /// Number of requests not yet answered
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Feed one event to the controller and execute its effects.
    ///
    /// Must be called within a tokio runtime, since fetches are spawned.
    pub fn dispatch(&mut self, event: ControllerEvent<C>) {
        let effects = self.controller.update(event);
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect<C::View>) {
        match effect {
            Effect::Fetch(request) => {
                let path = self.config.endpoint_path(request.endpoint).to_string();
                let query = request.query_string();
                info!(endpoint = ?request.endpoint, "Fetching {}?{}", path, query);

                let fetcher = self.fetcher.clone();
                let tx = self.tx.clone();
                let endpoint = request.endpoint;
                self.in_flight += 1;
                tokio::spawn(async move {
                    let body = fetcher.get(&path, &query).await;
                    // The receiver only goes away with the session
                    let _ = tx.send(Response { endpoint, body });
                });
            }
            Effect::Notice(notice) => {
                debug!(target_id = %notice.target, kind = ?notice.kind, "{}", notice.text);
                self.page.notices.push(notice);
            }
            Effect::Render(view) => self.page.view = Some(view),
            Effect::Navigate(url) => {
                info!("Navigate to {}", url);
                self.page.navigations.push(url);
            }
            Effect::PushUrl(url) => {
                debug!("Push URL state {}", url);
                self.page.history.push(url);
            }
        }
    }

    fn receive(&mut self, response: Response) {
        self.in_flight = self.in_flight.saturating_sub(1);

        let payload = response
            .body
            .and_then(|body| C::decode(&body).map_err(Into::into));
        match payload {
            Ok(payload) => self.dispatch(Event::DataLoaded(payload)),
            Err(e) => {
                warn!(endpoint = ?response.endpoint, "Request failed: {}", e);
                self.page.failed_requests += 1;
            }
        }
    }

    /// Process responses until no request is in flight
    pub async fn run_until_idle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(response) => self.receive(response),
                None => break,
            }
        }
    }

    /// Dispatch an event and process everything it sets in motion
    pub async fn run(&mut self, event: ControllerEvent<C>) -> &Page<C::View> {
        self.dispatch(event);
        self.run_until_idle().await;
        &self.page
    }
}

impl<F: Fetcher> Session<TimelineController, F> {
    /// Go back one URL state and re-apply it
    pub async fn back(&mut self) -> bool {
        let Some(url) = self.page.history.back().map(str::to_string) else {
            return false;
        };
        self.run(Event::Interaction(TimelineInteraction::UrlChanged(url)))
            .await;
        true
    }

    /// Go forward one URL state and re-apply it
    pub async fn forward(&mut self) -> bool {
        let Some(url) = self.page.history.forward().map(str::to_string) else {
            return false;
        };
        self.run(Event::Interaction(TimelineInteraction::UrlChanged(url)))
            .await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use benchview_core::catalog::{BenchmarkEntry, Entry, UnitGroup};
    use benchview_core::selection::ChangeSelection;
    use benchview_core::timeline::TimelineContent;
    use benchview_core::{
        BenchmarkChoice, Catalog, ChangeTableController, ChartType, ComparisonController,
        ComparisonSelection, NoticeKind, PlotOutcome,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Serves canned bodies by path and records every request
    #[derive(Clone, Default)]
    struct MemoryFetcher {
        bodies: Arc<HashMap<String, String>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl MemoryFetcher {
        fn with(bodies: &[(&str, &str)]) -> Self {
            Self {
                bodies: Arc::new(
                    bodies
                        .iter()
                        .map(|(p, b)| (p.to_string(), b.to_string()))
                        .collect(),
                ),
                requests: Arc::default(),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Fetcher for MemoryFetcher {
        fn get(
            &self,
            path: &str,
            query: &str,
        ) -> impl std::future::Future<Output = Result<String>> + Send {
            self.requests
                .lock()
                .unwrap()
                .push(format!("{}?{}", path, query));
            let body = self.bodies.get(path).cloned();
            let path = path.to_string();
            async move {
                body.ok_or(Error::ServerError {
                    status: 404,
                    url: path,
                })
            }
        }
    }

    const TABLE: &str = r#"<table class="tablesorter" data-lessisbetter="True">
<thead><tr><th>Benchmark</th><th>Change</th><th>Trend</th></tr></thead>
<tbody><tr data-change="-8.0" data-trend="1.0"><td>float</td><td>-8.00%</td><td>1.00%</td></tr></tbody>
</table>"#;

    const TIMELINE: &str = r#"{
        "error": "None",
        "timelines": [{
            "benchmark_id": 3,
            "benchmark": "float",
            "units": "seconds",
            "lessisbetter": " (less is better)",
            "baseline": "None",
            "branches": {"default": {"1": [["2011-05-12 10:00:00", 0.25, 0.01, "c3", ""]]}}
        }]
    }"#;

    fn catalog() -> Catalog {
        Catalog {
            executables: vec![Entry::new("1", "CPython"), Entry::new("2", "PyPy")],
            environments: vec![Entry::new("1", "Dual Core")],
            benchmarks: vec![BenchmarkEntry {
                id: "3".to_string(),
                name: "float".to_string(),
            }],
            bench_units: vec![UnitGroup {
                title: "Time".to_string(),
                benchmark_ids: vec!["3".to_string()],
                lessisbetter: " (less is better)".to_string(),
                units: "seconds".to_string(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_changes_session_loads_and_colors_table() {
        let fetcher = MemoryFetcher::with(&[("changes/table/", TABLE)]);
        let controller = ChangeTableController::new(
            DashboardConfig::default(),
            catalog(),
            ChangeSelection {
                trend: 10,
                revision: "c3".to_string(),
                executable: "1".to_string(),
                environment: "1".to_string(),
            },
        )
        .unwrap();
        let mut session = Session::new(controller, fetcher.clone(), DashboardConfig::default());

        let selection = session.controller().selection().clone();
        let page = session.run(Event::SelectionChanged(selection)).await;

        assert_eq!(page.notices[0].kind, NoticeKind::Loading);
        let view = page.view.as_ref().unwrap();
        assert_eq!(view.table.tables[0].rows[0].cells[1].status.unwrap().css_class(), "status-red");
        assert_eq!(fetcher.requests(), vec!["changes/table/?tre=10&rev=c3&exe=1&env=1"]);
    }

    #[tokio::test]
    async fn test_comparison_session_fetches_matrix_once() {
        let matrix = r#"{"error": "None", "1": {"1": {"3": 2.0}}, "2": {"1": {"3": 1.0}}}"#;
        let fetcher = MemoryFetcher::with(&[("comparison/json/", matrix)]);
        let selection = ComparisonSelection {
            executables: vec!["1".to_string(), "2".to_string()],
            benchmarks: vec!["3".to_string()],
            environments: vec!["1".to_string()],
            horizontal: false,
            baseline: Some("1".to_string()),
            chart: ChartType::NormalBars,
        };
        let controller =
            ComparisonController::new(DashboardConfig::default(), catalog(), selection.clone());
        let mut session = Session::new(controller, fetcher.clone(), DashboardConfig::default());

        session.run(Event::RenderRequested).await;
        let mut horizontal = selection;
        horizontal.horizontal = true;
        let page = session.run(Event::SelectionChanged(horizontal)).await;

        assert_eq!(fetcher.requests().len(), 1);
        match &page.view.as_ref().unwrap().plots[0] {
            PlotOutcome::Chart(chart) => assert_eq!(chart.title, "Time normalized to CPython"),
            PlotOutcome::Aborted(aborted) => panic!("unexpected abort: {}", aborted.message),
        }
    }

    #[tokio::test]
    async fn test_failed_request_keeps_placeholder() {
        let fetcher = MemoryFetcher::default();
        let controller = TimelineController::with_defaults(DashboardConfig::default(), catalog());
        let mut session = Session::new(controller, fetcher, DashboardConfig::default());

        let page = session
            .run(Event::Interaction(TimelineInteraction::UrlChanged(
                "?ben=float&env=1&exe=1".to_string(),
            )))
            .await;

        assert!(page.view.is_none());
        assert_eq!(page.failed_requests, 1);
        assert_eq!(page.last_notice().unwrap().kind, NoticeKind::Loading);
    }

    #[tokio::test]
    async fn test_timeline_history_navigation() {
        let fetcher = MemoryFetcher::with(&[("timeline/json/", TIMELINE)]);
        let controller = TimelineController::with_defaults(DashboardConfig::default(), catalog());
        let mut session = Session::new(controller, fetcher.clone(), DashboardConfig::default());

        let mut selection = session.controller().selection().clone();
        selection.benchmark = BenchmarkChoice::Grid;
        session.run(Event::SelectionChanged(selection.clone())).await;
        selection.benchmark = BenchmarkChoice::Single("float".to_string());
        session.run(Event::SelectionChanged(selection)).await;

        assert_eq!(session.page().history.len(), 2);
        assert!(matches!(
            session.page().view.as_ref().unwrap().content,
            TimelineContent::Single(_)
        ));

        assert!(session.back().await);
        assert_eq!(session.controller().selection().benchmark, BenchmarkChoice::Grid);
        assert!(matches!(
            session.page().view.as_ref().unwrap().content,
            TimelineContent::Grid(_)
        ));
        // Re-applying a URL doesn't record a new state
        assert_eq!(session.page().history.len(), 2);

        assert!(session.forward().await);
        assert!(!session.forward().await);
        assert_eq!(fetcher.requests().len(), 4);
    }
}
