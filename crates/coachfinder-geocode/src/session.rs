//! UI-facing search state.
//!
//! `SearchSession` is the single owner of the visible candidate list. Every
//! request is started with a [`SearchTicket`]; a response is applied only if
//! its ticket is still the latest one issued and the query text it was
//! issued for still matches the current query.

use std::collections::VecDeque;

use coachfinder_core::LocationCandidate;
use serde::Serialize;

use crate::error::GeocodeError;

pub const MAX_RECENT_SEARCHES: usize = 10;

/// Tag carried by an in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSession {
    query: String,
    results: Vec<LocationCandidate>,
    is_searching: bool,
    search_error: Option<String>,
    nearby_error: Option<String>,
    recent: VecDeque<String>,
    #[serde(skip)]
    seq: u64,
}

impl SearchSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn results(&self) -> &[LocationCandidate] {
        &self.results
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    #[must_use]
    pub fn search_error(&self) -> Option<&str> {
        self.search_error.as_deref()
    }

    #[must_use]
    pub fn nearby_error(&self) -> Option<&str> {
        self.nearby_error.as_deref()
    }

    /// Recent accepted queries, newest first.
    pub fn recent_searches(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    /// Records new input text.
    ///
    /// When the query is too short to search, results and errors are cleared
    /// and any in-flight request is invalidated.
    pub fn set_query(&mut self, query: &str, searchable: bool) {
        self.query = query.to_owned();
        if !searchable {
            self.seq += 1;
            self.results.clear();
            self.search_error = None;
            self.is_searching = false;
        }
    }

    /// Starts a text search for the current query.
    pub fn begin_search(&mut self) -> SearchTicket {
        self.begin()
    }

    /// Starts a nearby search. Nearby requests are tagged with the query that
    /// was current when they were issued.
    pub fn begin_nearby(&mut self) -> SearchTicket {
        self.begin()
    }

    fn begin(&mut self) -> SearchTicket {
        self.seq += 1;
        self.is_searching = true;
        SearchTicket {
            seq: self.seq,
            query: self.query.clone(),
        }
    }

    /// `true` when a response for `ticket` should be applied.
    #[must_use]
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.seq == self.seq && ticket.query == self.query
    }

    /// Applies a text search response. Returns `false` and leaves the
    /// session untouched when the response is stale.
    ///
    /// A failure clears the candidate list so no stale results stay visible
    /// next to the error.
    pub fn complete_search(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<Vec<LocationCandidate>, &GeocodeError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                seq = ticket.seq,
                current_seq = self.seq,
                query = %ticket.query,
                "discarding stale search response"
            );
            return false;
        }
        self.is_searching = false;
        match outcome {
            Ok(results) => {
                self.results = results;
                self.search_error = None;
                self.remember(&ticket.query);
            }
            Err(err) => {
                self.results.clear();
                self.search_error = Some(err.to_string());
            }
        }
        true
    }

    /// Applies a nearby response. Unlike text search, a failure keeps the
    /// previous candidates.
    pub fn complete_nearby(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<Vec<LocationCandidate>, &GeocodeError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(seq = ticket.seq, "discarding stale nearby response");
            return false;
        }
        self.is_searching = false;
        match outcome {
            Ok(results) => {
                self.results = results;
                self.nearby_error = None;
            }
            Err(err) => self.nearby_error = Some(err.to_string()),
        }
        true
    }

    /// Empties the query, results and errors. Recent searches are kept.
    pub fn clear(&mut self) {
        self.seq += 1;
        self.query.clear();
        self.results.clear();
        self.is_searching = false;
        self.search_error = None;
        self.nearby_error = None;
    }

    fn remember(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.recent.retain(|q| !q.eq_ignore_ascii_case(query));
        self.recent.push_front(query.to_owned());
        self.recent.truncate(MAX_RECENT_SEARCHES);
    }
}

#[cfg(test)]
mod tests {
    use coachfinder_core::Coordinates;

    use super::*;

    fn candidate(id: &str) -> LocationCandidate {
        LocationCandidate {
            id: id.to_owned(),
            name: format!("{id}, Maharashtra"),
            full_address: String::new(),
            area: id.to_owned(),
            state: "Maharashtra".to_owned(),
            coordinates: Coordinates::new(19.0, 72.8),
            distance_km: None,
        }
    }

    fn failure() -> GeocodeError {
        GeocodeError::SearchFailed {
            primary: Box::new(GeocodeError::ProviderStatus {
                provider: "places",
                status: 403,
            }),
            fallback: Some(Box::new(GeocodeError::ProviderStatus {
                provider: "nominatim",
                status: 503,
            })),
        }
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut session = SearchSession::new();
        session.set_query("Andheri", true);
        let q1 = session.begin_search();
        session.set_query("Borivali", true);
        let q2 = session.begin_search();

        assert!(session.complete_search(&q2, Ok(vec![candidate("Borivali")])));
        assert!(!session.complete_search(&q1, Ok(vec![candidate("Andheri")])));

        assert_eq!(session.results().len(), 1);
        assert_eq!(session.results()[0].id, "Borivali");
        assert!(!session.is_searching());
    }

    #[test]
    fn response_for_edited_query_is_discarded() {
        let mut session = SearchSession::new();
        session.set_query("Pune", true);
        let ticket = session.begin_search();
        session.set_query("Pune Ca", true);

        assert!(!session.complete_search(&ticket, Ok(vec![candidate("Pune")])));
        assert!(session.results().is_empty());
    }

    #[test]
    fn failure_clears_results_and_sets_error() {
        let mut session = SearchSession::new();
        session.set_query("Thane", true);
        let t = session.begin_search();
        session.complete_search(&t, Ok(vec![candidate("Thane")]));

        let t = session.begin_search();
        let err = failure();
        assert!(session.complete_search(&t, Err(&err)));
        assert!(session.results().is_empty());
        assert!(session
            .search_error()
            .is_some_and(|e| e.starts_with("location search failed")));
        assert!(!session.is_searching());
    }

    #[test]
    fn nearby_failure_keeps_previous_results() {
        let mut session = SearchSession::new();
        let t = session.begin_nearby();
        session.complete_nearby(&t, Ok(vec![candidate("Powai")]));

        let t = session.begin_nearby();
        let err = GeocodeError::NearbyFailed(Box::new(GeocodeError::ProviderStatus {
            provider: "nominatim",
            status: 500,
        }));
        assert!(session.complete_nearby(&t, Err(&err)));
        assert_eq!(session.results().len(), 1);
        assert!(session.nearby_error().is_some());
    }

    #[test]
    fn short_query_clears_and_invalidates_in_flight() {
        let mut session = SearchSession::new();
        session.set_query("Goa", true);
        let t = session.begin_search();
        session.complete_search(&t, Ok(vec![candidate("Goa")]));
        let in_flight = session.begin_search();

        session.set_query("G", false);
        assert!(session.results().is_empty());
        assert!(!session.is_searching());

        // Same text again: the sequence number still rejects the old ticket.
        session.set_query("Goa", true);
        assert!(!session.complete_search(&in_flight, Ok(vec![candidate("Goa")])));
    }

    #[test]
    fn recent_searches_are_deduplicated_newest_first_and_capped() {
        let mut session = SearchSession::new();
        for i in 0..12 {
            session.set_query(&format!("query {i}"), true);
            let t = session.begin_search();
            session.complete_search(&t, Ok(Vec::new()));
        }
        session.set_query("QUERY 5", true);
        let t = session.begin_search();
        session.complete_search(&t, Ok(Vec::new()));

        let recent: Vec<&str> = session.recent_searches().collect();
        assert_eq!(recent.len(), MAX_RECENT_SEARCHES);
        assert_eq!(recent[0], "QUERY 5");
        assert_eq!(recent[1], "query 11");
        assert_eq!(
            recent.iter().filter(|q| q.eq_ignore_ascii_case("query 5")).count(),
            1
        );
        assert!(!recent.contains(&"query 0"));
    }

    #[test]
    fn failed_search_is_not_remembered() {
        let mut session = SearchSession::new();
        session.set_query("Nowhere", true);
        let t = session.begin_search();
        let err = failure();
        session.complete_search(&t, Err(&err));
        assert_eq!(session.recent_searches().count(), 0);
    }

    #[test]
    fn clear_keeps_recent_searches() {
        let mut session = SearchSession::new();
        session.set_query("Nashik", true);
        let t = session.begin_search();
        session.complete_search(&t, Ok(vec![candidate("Nashik")]));
        session.clear();
        assert_eq!(session.query(), "");
        assert!(session.results().is_empty());
        assert_eq!(session.recent_searches().collect::<Vec<_>>(), ["Nashik"]);
    }
}
