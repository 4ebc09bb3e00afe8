//! Mood manager: today's mood and the month calendar grid.
//!
//! # Design
//! `today`/`set_today` maintain a one-slot cache of today's mood. Setting is
//! optimistic: the new value is published before the POST and rolled back to
//! the previous known-good value if the server rejects it.
//!
//! The month grid is rebuilt by fetching every calendar day of the month —
//! the backend has no batch endpoint — fanned out over a small worker pool.
//! Days without an entry (404) are simply absent, and an error on one day's
//! fetch never aborts the rest. Workers accumulate into private buffers that
//! are merged and swapped into the published grid in one step, so observers
//! never see a partially rebuilt calendar.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::session::SessionStore;
use crate::types::{Mood, MoodEntry, SetMood};

/// Worker threads used for the month-grid fan-out. A month is at most 31
/// requests against one server; a wider pool buys nothing.
const GRID_WORKERS: usize = 4;

/// State-change notifications published by the mood manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoodEvent {
    TodayChanged,
    GridRebuilt,
    Error(String),
}

#[derive(Default)]
struct MoodInner {
    today: Option<Mood>,
    grid: BTreeMap<NaiveDate, Mood>,
    last_error: Option<String>,
    subscribers: Vec<mpsc::Sender<MoodEvent>>,
}

/// Owns the mood caches and syncs them against the backend.
#[derive(Clone)]
pub struct MoodManager {
    api: ApiClient,
    transport: Arc<dyn Transport>,
    session: SessionStore,
    inner: Arc<Mutex<MoodInner>>,
}

impl MoodManager {
    pub fn new(api: ApiClient, transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self {
            api,
            transport,
            session,
            inner: Arc::new(Mutex::new(MoodInner::default())),
        }
    }

    /// Fetch today's mood entry. `Ok(None)` means no entry exists yet — a
    /// 404 here is an answer, not an error.
    pub fn today(&self) -> Result<Option<MoodEntry>, ApiError> {
        let token = match self.require_credential() {
            Ok(token) => token,
            Err(e) => return Err(self.fail(e)),
        };
        let req = self.api.build_today_mood(&token);
        match self
            .transport
            .send(req)
            .and_then(|resp| self.api.parse_mood_entry(resp))
        {
            Ok(entry) => {
                let mut inner = self.locked();
                inner.today = Some(entry.mood);
                inner.last_error = None;
                emit(&mut inner, MoodEvent::TodayChanged);
                Ok(Some(entry))
            }
            Err(ApiError::NotFound) => {
                let mut inner = self.locked();
                if inner.today.take().is_some() {
                    emit(&mut inner, MoodEvent::TodayChanged);
                }
                inner.last_error = None;
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Create or overwrite today's entry, optimistically. The cache shows
    /// the new mood immediately; on failure it rolls back to the value held
    /// before the call, never to a default.
    pub fn set_today(&self, mood: Mood) -> Result<MoodEntry, ApiError> {
        let token = match self.require_credential() {
            Ok(token) => token,
            Err(e) => return Err(self.fail(e)),
        };

        let previous = {
            let mut inner = self.locked();
            let previous = inner.today;
            inner.today = Some(mood);
            emit(&mut inner, MoodEvent::TodayChanged);
            previous
        };

        let result = self
            .api
            .build_set_today_mood(&token, &SetMood { mood })
            .and_then(|req| self.transport.send(req))
            .and_then(|resp| self.api.parse_mood_entry(resp));
        match result {
            Ok(entry) => {
                debug!(date = %entry.date, "today's mood confirmed");
                let mut inner = self.locked();
                inner.today = Some(entry.mood);
                inner.last_error = None;
                Ok(entry)
            }
            Err(e) => {
                let mut inner = self.locked();
                inner.today = previous;
                emit(&mut inner, MoodEvent::TodayChanged);
                drop(inner);
                Err(self.fail(e))
            }
        }
    }

    /// Rebuild the calendar grid for one month: one fetch per day, fanned
    /// out over `GRID_WORKERS` threads pulling days from a shared cursor.
    /// The merged result replaces the published grid in a single swap.
    pub fn month_grid(&self, year: i32, month: u32) -> Result<BTreeMap<NaiveDate, Mood>, ApiError> {
        let token = match self.require_credential() {
            Ok(token) => token,
            Err(e) => return Err(self.fail(e)),
        };
        let Some(days) = days_in_month(year, month) else {
            return Err(self.fail(ApiError::Encode(format!(
                "invalid calendar month {year}-{month:02}"
            ))));
        };

        let cursor = AtomicUsize::new(0);
        let mut grid = BTreeMap::new();
        thread::scope(|scope| {
            let workers: Vec<_> = (0..GRID_WORKERS.min(days.len()))
                .map(|_| {
                    scope.spawn(|| {
                        let mut found = Vec::new();
                        loop {
                            let i = cursor.fetch_add(1, Ordering::Relaxed);
                            let Some(&day) = days.get(i) else { break };
                            let req = self.api.build_mood_for(&token, day);
                            match self
                                .transport
                                .send(req)
                                .and_then(|resp| self.api.parse_mood_entry(resp))
                            {
                                Ok(entry) => found.push((day, entry.mood)),
                                Err(ApiError::NotFound) => {}
                                Err(e) => warn!(%day, error = %e, "skipping day in month grid"),
                            }
                        }
                        found
                    })
                })
                .collect();
            for worker in workers {
                match worker.join() {
                    Ok(found) => grid.extend(found),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });

        debug!(year, month, entries = grid.len(), "month grid rebuilt");
        let mut inner = self.locked();
        inner.grid = grid.clone();
        inner.last_error = None;
        emit(&mut inner, MoodEvent::GridRebuilt);
        Ok(grid)
    }

    /// Cached mood for today, if any.
    pub fn today_mood(&self) -> Option<Mood> {
        self.locked().today
    }

    /// Snapshot of the published month grid.
    pub fn grid(&self) -> BTreeMap<NaiveDate, Mood> {
        self.locked().grid.clone()
    }

    /// Message of the most recent failed operation, cleared on success.
    pub fn last_error(&self) -> Option<String> {
        self.locked().last_error.clone()
    }

    /// Receive a `MoodEvent` for every cache change from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<MoodEvent> {
        let (tx, rx) = mpsc::channel();
        self.locked().subscribers.push(tx);
        rx
    }

    fn require_credential(&self) -> Result<String, ApiError> {
        self.session.credential().ok_or(ApiError::Unauthenticated)
    }

    fn fail(&self, err: ApiError) -> ApiError {
        warn!(error = %err, "mood operation failed");
        let mut inner = self.locked();
        inner.last_error = Some(err.to_string());
        emit(&mut inner, MoodEvent::Error(err.to_string()));
        err
    }

    fn locked(&self) -> MutexGuard<'_, MoodInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn emit(inner: &mut MoodInner, event: MoodEvent) {
    inner.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
}

/// Every date of the given month, or `None` for an impossible year/month.
fn days_in_month(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = match month {
        12 => NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
        _ => NaiveDate::from_ymd_opt(year, month + 1, 1)?,
    };
    Some(first.iter_days().take_while(|d| *d < next).collect())
}
