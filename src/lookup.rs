//! Single lookup call site
//!
//! A [`WeatherLookup`] follows one `(location, date)` pair at a time, e.g.
//! the weather badge on an itinerary day. Changing the inputs starts a fresh
//! geocode → forecast sequence and invalidates the previous one; only the
//! sequence for the latest inputs may ever commit its result.
//!
//! Cancellation is logical. A superseded sequence keeps running (and may
//! still fill the caches) but its result is discarded. Each sequence carries
//! the generation it was started under and commits only if the call site is
//! still on that generation. Bumping the generation and checking it happen
//! under the same lock, so a superseded result can never be observed.

use crate::cache::lock;
use crate::enricher::WeatherEnricher;
use crate::models::LookupState;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// Message shown when a sequence fails in a way the resolvers did not absorb
pub const LOOKUP_FAILED: &str = "Failed to load weather";

/// Weather state for one call site
pub struct WeatherLookup {
    enricher: WeatherEnricher,
    site: Arc<CallSite>,
}

struct CallSite {
    generation: Mutex<u64>,
    state: watch::Sender<LookupState>,
}

impl CallSite {
    /// Move to a new generation, invalidating any sequence in flight
    fn advance(&self, next: impl FnOnce(&mut LookupState) -> bool) -> u64 {
        let mut generation = lock(&self.generation);
        *generation += 1;
        self.state.send_if_modified(next);
        *generation
    }

    /// Publish a sequence outcome if its generation is still current
    fn commit(&self, generation: u64, outcome: LookupState) -> bool {
        let current = lock(&self.generation);
        if *current != generation {
            debug!(
                "Discarding stale weather result (generation {} superseded by {})",
                generation, *current
            );
            return false;
        }
        self.state.send_replace(outcome);
        true
    }
}

impl WeatherLookup {
    pub(crate) fn new(enricher: WeatherEnricher) -> Self {
        let (state, _) = watch::channel(LookupState::idle());
        Self {
            enricher,
            site: Arc::new(CallSite {
                generation: Mutex::new(0),
                state,
            }),
        }
    }

    /// Point the call site at a new `(location, date)` pair
    ///
    /// `None` for either input, an empty location, or a date outside the
    /// fetch window resets to the idle state without any network call.
    /// Otherwise the state becomes loading and a new sequence is spawned.
    /// Without a reachable runtime the call site settles as failed.
    pub fn set_inputs(&self, location: Option<&str>, date: Option<&str>) {
        let eligible = match (location, date) {
            (Some(location), Some(date))
                if !location.is_empty() && self.enricher.is_fetch_eligible(date) =>
            {
                Some((location.to_string(), date.to_string()))
            }
            _ => None,
        };

        let Some((location, date)) = eligible else {
            debug!("Weather lookup ineligible for {:?} on {:?}", location, date);
            self.site.advance(|state| {
                if state.is_idle() {
                    false
                } else {
                    *state = LookupState::idle();
                    true
                }
            });
            return;
        };

        let generation = self.site.advance(|state| {
            *state = LookupState::loading();
            true
        });
        debug!(
            "Starting weather lookup #{} for '{}' on {}",
            generation, location, date
        );

        let enricher = self.enricher.clone();
        let site = Arc::clone(&self.site);
        let task = async move {
            let sequence = enricher.lookup_weather(&location, &date);
            let outcome = match AssertUnwindSafe(sequence).catch_unwind().await {
                Ok(Ok(weather)) => LookupState::resolved(weather),
                Ok(Err(e)) => {
                    warn!("Weather lookup for '{}' on {} failed: {}", location, date, e);
                    LookupState::failed(LOOKUP_FAILED)
                }
                Err(_) => {
                    error!("Weather lookup for '{}' on {} panicked", location, date);
                    LookupState::failed(LOOKUP_FAILED)
                }
            };
            site.commit(generation, outcome);
        };
        if !self.enricher.spawn(task) {
            self.site.commit(generation, LookupState::failed(LOOKUP_FAILED));
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> LookupState {
        self.site.state.borrow().clone()
    }

    /// Watch state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.site.state.subscribe()
    }

    /// Wait until the call site is not loading and return that state
    pub async fn settled(&self) -> LookupState {
        let mut receiver = self.site.state.subscribe();
        match receiver.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

impl Drop for WeatherLookup {
    fn drop(&mut self) {
        // Teardown counts as superseding input: nothing in flight may commit
        *lock(&self.site.generation) += 1;
    }
}
