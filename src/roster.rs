use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tracing::{debug, info, warn};

use crate::error::RosterError;
use crate::load_state::LoadState;
use crate::observe::{Publisher, Subscription};
use crate::roster_fetch::parse_roster_json;

/// Transport seam for the roster fetch: returns the raw response body.
pub trait RosterSource: Send + Sync + 'static {
    fn fetch(&self) -> Result<String, RosterError>;
}

impl<F> RosterSource for F
where
    F: Fn() -> Result<String, RosterError> + Send + Sync + 'static,
{
    fn fetch(&self) -> Result<String, RosterError> {
        self()
    }
}

/// Owns one remote roster fetch at a time and publishes its [`LoadState`].
pub struct RosterLoader {
    shared: Arc<Shared>,
}

struct Shared {
    source: Box<dyn RosterSource>,
    status: Mutex<Status>,
    fetches: AtomicUsize,
}

#[derive(Default)]
struct Status {
    state: LoadState,
    in_flight: bool,
    publisher: Publisher<LoadState>,
}

impl Status {
    fn set(&mut self, next: LoadState) {
        self.state = next;
        self.publisher.publish(&self.state);
    }
}

impl Shared {
    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_fetch(&self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.source.fetch()))
            .unwrap_or_else(|_| Err(RosterError::Transport("roster source panicked".to_string())))
            .and_then(|body| parse_roster_json(&body));
        let next = match outcome {
            Ok(players) => {
                info!(count = players.len(), "roster loaded");
                LoadState::Success(players)
            }
            Err(err) => {
                warn!(error = %err, "roster fetch failed");
                LoadState::Failure(err.display_message())
            }
        };
        let mut status = self.status();
        status.in_flight = false;
        status.set(next);
    }
}

impl RosterLoader {
    pub fn new(source: impl RosterSource) -> Self {
        Self {
            shared: Arc::new(Shared {
                source: Box::new(source),
                status: Mutex::new(Status::default()),
                fetches: AtomicUsize::new(0),
            }),
        }
    }

    /// Starts a fetch unless one is already running. Returns whether it started.
    pub fn trigger(&self) -> bool {
        {
            let mut status = self.shared.status();
            if status.in_flight {
                debug!("roster fetch already in flight, ignoring trigger");
                return false;
            }
            status.in_flight = true;
            status.set(LoadState::Loading);
        }
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("roster-fetch".to_string())
            .spawn(move || shared.run_fetch());
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn roster fetch");
            let mut status = self.shared.status();
            status.in_flight = false;
            status.set(LoadState::Failure(
                RosterError::Transport(err.to_string()).display_message(),
            ));
            return false;
        }
        self.shared.fetches.fetch_add(1, Ordering::SeqCst);
        info!("roster fetch started");
        true
    }

    pub fn state(&self) -> LoadState {
        self.shared.status().state.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.shared.status().in_flight
    }

    pub fn fetch_count(&self) -> usize {
        self.shared.fetches.load(Ordering::SeqCst)
    }

    /// Yields the current state immediately, then every later transition.
    pub fn subscribe(&self) -> Subscription<LoadState> {
        let mut status = self.shared.status();
        let current = status.state.clone();
        status.publisher.subscribe(current)
    }
}

impl std::fmt::Debug for RosterLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.shared.status();
        f.debug_struct("RosterLoader")
            .field("state", &status.state.label())
            .field("in_flight", &status.in_flight)
            .field("fetches", &self.fetch_count())
            .finish()
    }
}
