//! The control layer: owns the loaded index and the selection, guards against
//! reads during a load and coalesces bursts of selection changes into a
//! single recomputation.

use crate::error::Result;
use crate::index::DatasetIndex;
use crate::loader::{self, TextSource};
use crate::types::{Region, SelectionState};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What a call to [`Session::load`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The dataset was fetched and indexed and is now current.
    Loaded,
    /// Another load was in flight, so nothing was fetched.
    AlreadyLoading,
}

/// Cancel-and-reschedule timer: every request pushes the deadline out by the
/// window, and the refresh fires once the window passes without a new request.
#[derive(Debug, Clone)]
pub struct Coalescer {
    window: Duration,
    last_request: Option<Instant>,
}

impl Coalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_request: None,
        }
    }

    pub fn request(&mut self, now: Instant) {
        self.last_request = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_request.is_some()
    }

    /// Time left until a pending request fires, zero if it is already due.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.last_request
            .map(|at| self.window.saturating_sub(now.saturating_duration_since(at)))
    }

    /// Fires at most once per burst.
    pub fn take(&mut self, now: Instant) -> bool {
        match self.remaining(now) {
            Some(left) if left.is_zero() => {
                self.last_request = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.last_request = None;
    }
}

#[derive(Debug)]
pub struct Session {
    index: Option<DatasetIndex>,
    selection: SelectionState,
    loading: bool,
    coalescer: Coalescer,
    refresh_now: bool,
}

impl Session {
    pub fn new(top_n: usize, debounce: Duration) -> Self {
        Self {
            index: None,
            selection: SelectionState::new(top_n),
            loading: false,
            coalescer: Coalescer::new(debounce),
            refresh_now: false,
        }
    }

    pub fn index(&self) -> Option<&DatasetIndex> {
        if self.loading {
            return None;
        }
        self.index.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marks a load as in flight. Returns `false` if one already is.
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            warn!("load already in progress");
            return false;
        }
        self.loading = true;
        true
    }

    /// Ends the in-flight load. On success the new index replaces the old one
    /// in a single assignment, the benefit selection resets to every category
    /// and exactly one refresh becomes due. On failure the previous index
    /// stays and the error is handed back.
    pub fn finish_load(&mut self, result: Result<DatasetIndex>) -> Result<()> {
        self.loading = false;
        let index = result?;
        if let Region::Area(id) = &self.selection.region {
            if index.area(id).is_none() {
                debug!(area_id = %id, "selected area missing from new dataset, showing all regions");
                self.selection.region = Region::All;
            }
        }
        self.selection.select_all();
        self.index = Some(index);
        self.coalescer.clear();
        self.refresh_now = true;
        Ok(())
    }

    pub fn load(&mut self, source: &dyn TextSource) -> Result<LoadOutcome> {
        if !self.begin_load() {
            return Ok(LoadOutcome::AlreadyLoading);
        }
        let result = loader::load_index(source);
        self.finish_load(result)?;
        Ok(LoadOutcome::Loaded)
    }

    /// Applies a selection change and schedules a refresh.
    pub fn update_selection<F>(&mut self, now: Instant, mutate: F)
    where
        F: FnOnce(&mut SelectionState),
    {
        mutate(&mut self.selection);
        self.coalescer.request(now);
        if self.loading {
            debug!("refresh queued until load completes");
        }
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.refresh_now || self.coalescer.is_pending()
    }

    /// How long a caller should wait before [`Session::take_refresh`] fires.
    pub fn refresh_wait(&self, now: Instant) -> Option<Duration> {
        if self.refresh_now {
            return Some(Duration::ZERO);
        }
        self.coalescer.remaining(now)
    }

    /// `true` when a recomputation should run now. Never fires while loading
    /// or before the first dataset is in place.
    pub fn take_refresh(&mut self, now: Instant) -> bool {
        if self.loading || self.index.is_none() {
            return false;
        }
        if self.refresh_now {
            self.refresh_now = false;
            self.coalescer.clear();
            info!("refresh after load");
            return true;
        }
        self.coalescer.take(now)
    }
}
