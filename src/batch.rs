//! Batch lookup call site
//!
//! Keeps one result slot per caller-assigned id. An id is dispatched once,
//! the first time it shows up with eligible inputs; after that its slot is
//! only ever overwritten by its own sequence settling. There is no stale
//! suppression here: callers mint a new id to force a refresh.
//!
//! Re-issuing an id with different `(location, date)` is a caller contract
//! violation. The new inputs are ignored and the mismatch is logged.

use crate::cache::lock;
use crate::enricher::WeatherEnricher;
use crate::models::{BatchResult, LookupRequest};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// Weather results for a keyed set of requests
pub struct BatchLookup {
    enricher: WeatherEnricher,
    results: Arc<watch::Sender<HashMap<String, BatchResult>>>,
    dispatched: Mutex<HashMap<String, (String, String)>>,
}

impl BatchLookup {
    pub(crate) fn new(enricher: WeatherEnricher) -> Self {
        let (results, _) = watch::channel(HashMap::new());
        Self {
            enricher,
            results: Arc::new(results),
            dispatched: Mutex::new(HashMap::new()),
        }
    }

    /// Scan `requests` and dispatch every eligible id that has no slot yet
    ///
    /// Safe to call with the full request list on every change; ids already
    /// seen are left alone. Without a reachable runtime new slots settle empty.
    pub fn register_all(&self, requests: &[LookupRequest]) {
        let mut dispatched = lock(&self.dispatched);

        for request in requests {
            if let Some((location, date)) = dispatched.get(&request.id) {
                if *location != request.location || *date != request.date {
                    debug!(
                        "Ignoring new inputs for batch id '{}': already dispatched for '{}' on {}",
                        request.id, location, date
                    );
                }
                continue;
            }

            if request.location.is_empty() || !self.enricher.is_fetch_eligible(&request.date) {
                debug!(
                    "Skipping batch id '{}': '{}' on {} is not eligible",
                    request.id, request.location, request.date
                );
                continue;
            }

            dispatched.insert(
                request.id.clone(),
                (request.location.clone(), request.date.clone()),
            );
            self.results.send_modify(|results| {
                results.insert(request.id.clone(), BatchResult::pending(&request.id));
            });
            self.dispatch(request.clone());
        }
    }

    fn dispatch(&self, request: LookupRequest) {
        let enricher = self.enricher.clone();
        let results = Arc::clone(&self.results);

        let id = request.id.clone();
        let task = async move {
            let sequence = enricher.lookup_weather(&request.location, &request.date);
            let weather = match AssertUnwindSafe(sequence).catch_unwind().await {
                Ok(Ok(weather)) => weather,
                Ok(Err(e)) => {
                    warn!("Batch lookup '{}' failed: {}", request.id, e);
                    None
                }
                Err(_) => {
                    error!("Batch lookup '{}' panicked", request.id);
                    None
                }
            };
            debug!(
                "Batch lookup '{}' settled (weather: {})",
                request.id,
                weather.is_some()
            );
            results.send_modify(|results| {
                results.insert(request.id.clone(), BatchResult::settled(request.id, weather));
            });
        };
        if !self.enricher.spawn(task) {
            self.results.send_modify(|results| {
                results.insert(id.clone(), BatchResult::settled(id, None));
            });
        }
    }

    /// Result slot for `id`; `None` means never registered or not eligible
    #[must_use]
    pub fn get_result(&self, id: &str) -> Option<BatchResult> {
        self.results.borrow().get(id).cloned()
    }

    /// Copy of every slot
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, BatchResult> {
        self.results.borrow().clone()
    }

    /// Watch changes to the result mapping
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HashMap<String, BatchResult>> {
        self.results.subscribe()
    }

    /// Wait until no slot is loading and return the mapping
    pub async fn settled(&self) -> HashMap<String, BatchResult> {
        let mut receiver = self.results.subscribe();
        match receiver
            .wait_for(|results| results.values().all(|result| !result.loading))
            .await
        {
            Ok(results) => results.clone(),
            Err(_) => self.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProvider, day, enricher, eventually};

    #[tokio::test]
    async fn test_every_id_gets_its_own_slot() {
        let provider = FakeProvider::new();
        let enricher = enricher(&provider);
        let batch = enricher.batch();
        let date = day(2);

        batch.register_all(&[
            LookupRequest::new("morning", "Kyoto", &date),
            LookupRequest::new("evening", "Kyoto", &date),
        ]);
        assert_eq!(batch.get_result("morning"), Some(BatchResult::pending("morning")));

        let results = batch.settled().await;
        assert_eq!(results.len(), 2);
        let morning = results["morning"].weather.clone().unwrap();
        let evening = results["evening"].weather.clone().unwrap();
        assert_eq!(morning, evening);
        assert_eq!(results["evening"].id, "evening");
        assert!(!results["evening"].loading);
    }

    #[tokio::test]
    async fn test_ineligible_requests_get_no_slot() {
        let provider = FakeProvider::new();
        let enricher = enricher(&provider);
        let batch = enricher.batch();

        batch.register_all(&[
            LookupRequest::new("far", "Kyoto", day(20)),
            LookupRequest::new("past", "Kyoto", day(-8)),
            LookupRequest::new("malformed", "Kyoto", "05/01/2024"),
            LookupRequest::new("nowhere", "", day(1)),
        ]);

        assert!(batch.snapshot().is_empty());
        assert_eq!(batch.get_result("far"), None);
        tokio::task::yield_now().await;
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_known_ids_are_not_redispatched() {
        let provider = FakeProvider::new();
        let enricher = enricher(&provider);
        let batch = enricher.batch();
        provider.mark_unavailable(&day(3));
        let requests = [LookupRequest::new("day-3", "Kyoto", day(3))];

        batch.register_all(&requests);
        let first = batch.settled().await;
        assert!(!first["day-3"].weather.as_ref().unwrap().available);

        // availability changing does not refresh an existing slot
        provider.mark_available(&day(3));
        batch.register_all(&requests);
        tokio::task::yield_now().await;

        assert_eq!(batch.snapshot(), first);
        assert_eq!(provider.forecast_calls(), 1);
    }

    #[tokio::test]
    async fn test_reissued_id_with_new_inputs_is_ignored() {
        let provider = FakeProvider::new();
        let enricher = enricher(&provider);
        let batch = enricher.batch();
        provider.hold("Kyoto");

        batch.register_all(&[LookupRequest::new("trip", "Kyoto", day(1))]);
        batch.register_all(&[LookupRequest::new("trip", "Osaka", day(1))]);
        eventually(|| provider.geocode_calls() == 1).await;
        provider.release("Kyoto");

        let results = batch.settled().await;
        assert_eq!(
            results["trip"].weather.as_ref().unwrap().description,
            FakeProvider::description_for(35.0116, 135.7681)
        );
        assert_eq!(provider.geocode_calls(), 1);
    }

    #[tokio::test]
    async fn test_result_lands_even_after_request_list_changes() {
        let provider = FakeProvider::new();
        let enricher = enricher(&provider);
        let batch = enricher.batch();
        provider.hold("Kyoto");

        batch.register_all(&[LookupRequest::new("a", "Kyoto", day(1))]);
        batch.register_all(&[LookupRequest::new("b", "Osaka", day(1))]);
        eventually(|| provider.geocode_calls() == 2).await;
        provider.release("Kyoto");

        let results = batch.settled().await;
        assert!(results["a"].weather.is_some());
        assert!(results["b"].weather.is_some());
    }

    #[test]
    fn test_register_without_runtime_settles_empty() {
        let provider = FakeProvider::new();
        let enricher = enricher(&provider);
        let batch = enricher.batch();

        batch.register_all(&[LookupRequest::new("a", "Kyoto", day(1))]);

        assert_eq!(batch.get_result("a"), Some(BatchResult::settled("a", None)));
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_unresolved_location_settles_empty() {
        let provider = FakeProvider::new();
        let enricher = enricher(&provider);
        let batch = enricher.batch();

        batch.register_all(&[LookupRequest::new("x", "Nonexistent Place", day(1))]);
        let results = batch.settled().await;

        assert_eq!(results["x"], BatchResult::settled("x", None));
        assert_eq!(provider.forecast_calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_and_single_lookups_share_caches() {
        let provider = FakeProvider::new();
        let enricher = enricher(&provider);
        let date = day(4);

        let lookup = enricher.lookup();
        lookup.set_inputs(Some("Osaka"), Some(&date));
        lookup.settled().await;

        let batch = enricher.batch();
        batch.register_all(&[LookupRequest::new("osaka", "osaka", &date)]);
        batch.settled().await;

        assert_eq!(provider.geocode_calls(), 1);
        assert_eq!(provider.forecast_calls(), 1);
    }
}
