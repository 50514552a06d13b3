//! Wires input events to the service and publishes session snapshots.

use std::sync::Arc;
use std::time::Duration;

use coachfinder_core::Coordinates;
use tokio::sync::watch;

use crate::debounce::Debouncer;
use crate::geolocation::LocationError;
use crate::service::LocationSearchService;
use crate::session::{SearchSession, SearchTicket};

/// Drives a [`SearchSession`] from text input and nearby requests.
///
/// Text changes are debounced; nearby requests run immediately. Every
/// session change is published on a `watch` channel, so a UI can render from
/// [`SearchController::subscribe`] without locking.
pub struct SearchController {
    service: Arc<LocationSearchService>,
    state: Arc<watch::Sender<SearchSession>>,
    debouncer: Debouncer,
}

impl SearchController {
    #[must_use]
    pub fn new(service: Arc<LocationSearchService>) -> Self {
        let delay = Duration::from_millis(service.config().debounce_ms);
        let (state, _) = watch::channel(SearchSession::new());
        Self {
            service,
            state: Arc::new(state),
            debouncer: Debouncer::new(delay),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchSession> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SearchSession {
        self.state.borrow().clone()
    }

    /// Records the new input and restarts the debounce timer.
    ///
    /// Input below the minimum length clears the results immediately and
    /// cancels the waiting search.
    pub fn on_query_changed(&mut self, text: &str) {
        let searchable = self.service.is_searchable(text);
        self.state.send_modify(|s| s.set_query(text, searchable));
        if !searchable {
            self.debouncer.cancel();
            return;
        }

        let service = Arc::clone(&self.service);
        let state = Arc::clone(&self.state);
        self.debouncer
            .schedule(async move { run_text_search(&service, &state).await });
    }

    /// Searches around `origin` right away and publishes the ranked list.
    pub async fn search_nearby(&self, origin: Coordinates) {
        let Some(ticket) = issue(&self.state, SearchSession::begin_nearby) else {
            return;
        };
        let result = self.service.search_nearby(origin).await;
        let applied = match result {
            Ok(results) => self
                .state
                .send_if_modified(|s| s.complete_nearby(&ticket, Ok(results))),
            Err(err) => self
                .state
                .send_if_modified(|s| s.complete_nearby(&ticket, Err(&err))),
        };
        if !applied {
            tracing::debug!(seq = ticket.seq, "nearby response superseded");
        }
    }

    /// Resolves the device position and runs a nearby search around it.
    ///
    /// # Errors
    ///
    /// Returns the [`LocationError`] from the device collaborator; the
    /// session is left untouched in that case.
    pub async fn search_near_me(&self) -> Result<Coordinates, LocationError> {
        let origin = self.service.current_location().await?;
        self.search_nearby(origin).await;
        Ok(origin)
    }

    /// Waits for a pending debounced search to fire and for its response to
    /// be applied or discarded.
    pub async fn flush(&mut self) {
        self.debouncer.flush().await;
    }

    pub fn clear(&mut self) {
        self.debouncer.cancel();
        self.state.send_modify(SearchSession::clear);
    }
}

fn issue(
    state: &watch::Sender<SearchSession>,
    begin: fn(&mut SearchSession) -> SearchTicket,
) -> Option<SearchTicket> {
    let mut ticket = None;
    state.send_modify(|s| ticket = Some(begin(s)));
    ticket
}

async fn run_text_search(service: &LocationSearchService, state: &watch::Sender<SearchSession>) {
    let Some(ticket) = issue(state, SearchSession::begin_search) else {
        return;
    };
    let result = service.search_by_text(&ticket.query).await;
    let applied = match result {
        Ok(results) => state.send_if_modified(|s| s.complete_search(&ticket, Ok(results))),
        Err(err) => {
            tracing::warn!(query = %ticket.query, error = %err, "location search failed");
            state.send_if_modified(|s| s.complete_search(&ticket, Err(&err)))
        }
    };
    if !applied {
        tracing::debug!(seq = ticket.seq, query = %ticket.query, "search response superseded");
    }
}
