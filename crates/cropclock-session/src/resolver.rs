//! Location resolution for one view: device position, typed address, and
//! search-as-you-type, all feeding a single [`EnvironmentSnapshot`] slot.
//!
//! Every trigger takes a ticket from the slot it writes. Only the newest
//! ticket commits, so whichever trigger the user fired last decides what is
//! shown, regardless of the order in which responses arrive. The debounce
//! timer is the one place where work is actually cancelled.

use std::time::Duration;

use cropclock_core::Config;
use cropclock_geo::{
    ConditionsSource, DeviceLocator, EnvironmentSnapshot, Geocoder, PlaceCandidate,
    UNKNOWN_LOCATION,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::ResolveError;
use crate::latest::{Latest, Ticket};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    pub debounce: Duration,
    pub min_query_chars: usize,
    pub suggestion_limit: usize,
    pub geolocation_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_query_chars: 3,
            suggestion_limit: 5,
            geolocation_timeout: Duration::from_secs(10),
        }
    }
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.autocomplete.debounce(),
            min_query_chars: config.autocomplete.min_query_chars,
            suggestion_limit: config.autocomplete.suggestion_limit,
            geolocation_timeout: config.location.geolocation_timeout(),
        }
    }
}

/// What a view renders for its location panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationStatus {
    /// Last completed resolution; kept while a newer one is in flight
    pub snapshot: Option<EnvironmentSnapshot>,
    pub resolving: bool,
    /// Device location was denied or unavailable; show the address input
    pub manual_entry_required: bool,
    pub error: Option<String>,
}

/// Suggestions together with the query that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionList {
    pub query: String,
    pub candidates: Vec<PlaceCandidate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(EnvironmentSnapshot),
    ManualEntryRequired,
    /// A newer trigger took over; nothing was written
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionUpdate {
    Shown(Vec<PlaceCandidate>),
    Cleared,
    Superseded,
}

pub struct LocationResolver<G, W, D> {
    geocoder: G,
    weather: W,
    locator: D,
    settings: ResolverSettings,
    status: Latest<LocationStatus>,
    suggestions: Latest<Option<SuggestionList>>,
    pending_search: Mutex<CancellationToken>,
}

impl<G, W, D> LocationResolver<G, W, D>
where
    G: Geocoder,
    W: ConditionsSource,
    D: DeviceLocator,
{
    pub fn new(geocoder: G, weather: W, locator: D, settings: ResolverSettings) -> Self {
        Self {
            geocoder,
            weather,
            locator,
            settings,
            status: Latest::new(LocationStatus::default()),
            suggestions: Latest::new(None),
            pending_search: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn status(&self) -> LocationStatus {
        self.status.get()
    }

    pub fn snapshot(&self) -> Option<EnvironmentSnapshot> {
        self.status.get().snapshot
    }

    pub fn suggestions(&self) -> Option<SuggestionList> {
        self.suggestions.get()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<LocationStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_suggestions(&self) -> watch::Receiver<Option<SuggestionList>> {
        self.suggestions.subscribe()
    }

    /// Resolve from the device position. Run once when the view activates.
    ///
    /// Denied, unavailable or slow device location is not an error: the view
    /// is flagged for manual entry and the snapshot stays unset.
    pub async fn resolve_automatic(&self) -> Result<Resolution, ResolveError> {
        let ticket = self.begin_resolution();

        let position = match tokio::time::timeout(
            self.settings.geolocation_timeout,
            self.locator.current_position(),
        )
        .await
        {
            Ok(Ok(position)) => position,
            Ok(Err(e)) => {
                tracing::info!("Device location unavailable ({}), manual entry required", e);
                return Ok(self.require_manual_entry(ticket));
            }
            Err(_) => {
                tracing::info!(
                    "Device location timed out after {:?}, manual entry required",
                    self.settings.geolocation_timeout
                );
                return Ok(self.require_manual_entry(ticket));
            }
        };

        if !self.status.is_current(ticket) {
            tracing::debug!("Automatic resolution superseded before lookup");
            return Ok(Resolution::Superseded);
        }

        let (place, conditions) = tokio::join!(
            self.geocoder.reverse_geocode(position),
            self.weather.current_conditions(position),
        );

        let label = match place {
            Ok(place) => place.label,
            Err(e) => {
                tracing::warn!("Reverse geocode failed for {}: {}", position, e);
                UNKNOWN_LOCATION.to_string()
            }
        };

        let result = conditions
            .map(|c| EnvironmentSnapshot::new(label, c))
            .map_err(ResolveError::from);
        self.finish(ticket, result)
    }

    /// Resolve a typed address: first search hit, then its weather.
    pub async fn resolve_manual(&self, address: &str) -> Result<Resolution, ResolveError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ResolveError::Precondition("address required"));
        }

        self.dismiss_suggestions();
        let ticket = self.begin_resolution();
        let result = self.lookup_address(address).await;
        self.finish(ticket, result)
    }

    /// Feed one keystroke's worth of input text.
    ///
    /// Resolves once this keystroke's search is shown, cleared, or
    /// overtaken by a later keystroke.
    pub async fn on_query_changed(&self, text: &str) -> Result<SuggestionUpdate, ResolveError> {
        let cancel = self.restart_debounce();
        let query = text.trim().to_string();
        let ticket = self.suggestions.begin(|_| {});

        if query.chars().count() < self.settings.min_query_chars {
            self.suggestions.commit(ticket, |s| *s = None);
            return Ok(SuggestionUpdate::Cleared);
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(SuggestionUpdate::Superseded);
            }
            _ = tokio::time::sleep(self.settings.debounce) => {}
        }

        match self
            .geocoder
            .search(&query, self.settings.suggestion_limit)
            .await
        {
            Ok(candidates) => {
                let committed = self.suggestions.commit(ticket, |s| {
                    *s = Some(SuggestionList {
                        query: query.clone(),
                        candidates: candidates.clone(),
                    })
                });
                if committed {
                    tracing::debug!("Showing {} suggestions for '{}'", candidates.len(), query);
                    Ok(SuggestionUpdate::Shown(candidates))
                } else {
                    tracing::debug!("Dropping stale suggestions for '{}'", query);
                    Ok(SuggestionUpdate::Superseded)
                }
            }
            Err(e) if self.suggestions.is_current(ticket) => {
                tracing::warn!("Suggestion search for '{}' failed: {}", query, e);
                Err(e.into())
            }
            Err(_) => Ok(SuggestionUpdate::Superseded),
        }
    }

    /// Use a suggestion directly; its coordinate is already known.
    pub async fn select_suggestion(
        &self,
        candidate: &PlaceCandidate,
    ) -> Result<Resolution, ResolveError> {
        self.dismiss_suggestions();
        let ticket = self.begin_resolution();
        let result = self
            .weather
            .current_conditions(candidate.coordinate)
            .await
            .map(|c| EnvironmentSnapshot::new(candidate.primary_label(), c))
            .map_err(ResolveError::from);
        self.finish(ticket, result)
    }

    async fn lookup_address(&self, address: &str) -> Result<EnvironmentSnapshot, ResolveError> {
        let candidate = self
            .geocoder
            .search(address, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::LocationNotFound(address.to_string()))?;

        let conditions = self.weather.current_conditions(candidate.coordinate).await?;
        Ok(EnvironmentSnapshot::new(candidate.primary_label(), conditions))
    }

    fn begin_resolution(&self) -> Ticket {
        self.status.begin(|s| {
            s.resolving = true;
            s.error = None;
        })
    }

    fn require_manual_entry(&self, ticket: Ticket) -> Resolution {
        let committed = self.status.commit(ticket, |s| {
            s.resolving = false;
            s.manual_entry_required = true;
        });
        if committed {
            Resolution::ManualEntryRequired
        } else {
            Resolution::Superseded
        }
    }

    fn finish(
        &self,
        ticket: Ticket,
        result: Result<EnvironmentSnapshot, ResolveError>,
    ) -> Result<Resolution, ResolveError> {
        match result {
            Ok(snapshot) => {
                let committed = self.status.commit(ticket, |s| {
                    s.snapshot = Some(snapshot.clone());
                    s.resolving = false;
                    s.manual_entry_required = false;
                });
                if committed {
                    tracing::info!(
                        "Resolved {}: {}C, {}% humidity",
                        snapshot.location_label,
                        snapshot.temperature_c,
                        snapshot.humidity_pct
                    );
                    Ok(Resolution::Resolved(snapshot))
                } else {
                    tracing::debug!("Dropping stale resolution for {}", snapshot.location_label);
                    Ok(Resolution::Superseded)
                }
            }
            Err(e) => {
                let message = e.display_message();
                let committed = self.status.commit(ticket, |s| {
                    s.resolving = false;
                    s.error = Some(message);
                });
                if committed {
                    tracing::warn!("Location resolution failed: {}", e);
                    Err(e)
                } else {
                    tracing::debug!("Dropping stale failure: {}", e);
                    Ok(Resolution::Superseded)
                }
            }
        }
    }

    /// Cancel the pending keystroke timer and hand out a fresh one.
    fn restart_debounce(&self) -> CancellationToken {
        let mut pending = self.pending_search.lock();
        pending.cancel();
        *pending = CancellationToken::new();
        pending.clone()
    }

    fn dismiss_suggestions(&self) {
        self.pending_search.lock().cancel();
        self.suggestions.begin(|s| *s = None);
    }
}
