//! Debounced filter pipeline.
//!
//! Holds the raw text of every filter field plus the settled [`FilterSnapshot`] built
//! from them. Non-search fields settle synchronously; the search field settles only
//! after its debounce elapses without another edit. Each change of the settled state
//! emits exactly one snapshot, both as the return value of the call that caused it and
//! on the [`watch`] channel returned by [`FilterPipeline::subscribe`].

use tokio::sync::watch;
use tokio::time::{Duration, Instant};

use crate::debounce::Debouncer;
use stash_core::{ClientConfig, ClientResult, FilterField, FilterInput, FilterSnapshot, SizePreset};

pub struct FilterPipeline {
    input: FilterInput,
    settled: FilterSnapshot,
    search: Debouncer<String>,
    tx: watch::Sender<FilterSnapshot>,
    emitted: u64,
}

impl FilterPipeline {
    pub fn new(search_debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(FilterSnapshot::default());
        Self {
            input: FilterInput::default(),
            settled: FilterSnapshot::default(),
            search: Debouncer::new(search_debounce),
            tx,
            emitted: 0,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.search_debounce)
    }

    /// Receiver that always holds the latest emitted snapshot.
    pub fn subscribe(&self) -> watch::Receiver<FilterSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> &FilterSnapshot {
        &self.settled
    }

    pub fn input(&self) -> &FilterInput {
        &self.input
    }

    pub fn has_active_filters(&self) -> bool {
        self.input.has_active_filters()
    }

    pub fn has_pending_search(&self) -> bool {
        self.search.is_pending()
    }

    /// Number of snapshots emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Record a raw field value.
    ///
    /// Search input is buffered and returns `Ok(None)`; it surfaces later through
    /// [`tick`](Self::tick) or [`poll`](Self::poll). Other fields settle immediately and
    /// return the emitted snapshot when the settled value changed. An unparseable size
    /// or date is kept as raw text but rejected for the snapshot.
    pub fn set_field(
        &mut self,
        field: FilterField,
        value: impl Into<String>,
    ) -> ClientResult<Option<FilterSnapshot>> {
        let value = value.into();
        self.input.set(field, value.clone());

        if field.is_debounced() {
            if self.search.push(value, Instant::now()) {
                tracing::trace!("Search input superseded pending value");
            }
            return Ok(None);
        }

        if self.settled.apply(field, &value)? {
            Ok(Some(self.emit()))
        } else {
            Ok(None)
        }
    }

    /// Set both size bounds as one transition; emits at most once.
    pub fn set_size_range(
        &mut self,
        min: impl Into<String>,
        max: impl Into<String>,
    ) -> ClientResult<Option<FilterSnapshot>> {
        let (min, max) = (min.into(), max.into());
        self.input.set(FilterField::MinSize, min.clone());
        self.input.set(FilterField::MaxSize, max.clone());

        let mut next = self.settled.clone();
        next.apply(FilterField::MinSize, &min)?;
        next.apply(FilterField::MaxSize, &max)?;

        if next == self.settled {
            return Ok(None);
        }
        self.settled = next;
        Ok(Some(self.emit()))
    }

    pub fn apply_size_preset(&mut self, preset: SizePreset) -> ClientResult<Option<FilterSnapshot>> {
        let (min, max) = preset.bounds();
        tracing::debug!(preset = preset.label(), "Applying size preset");
        self.set_size_range(min, max)
    }

    /// Reset every field to empty in one transition. Always emits exactly one snapshot.
    pub fn clear(&mut self) -> FilterSnapshot {
        if self.search.cancel().is_some() {
            tracing::debug!("Cancelled pending search on clear");
        }
        self.input = FilterInput::default();
        self.settled = FilterSnapshot::default();
        self.emit()
    }

    /// Settle the pending search if its debounce has already elapsed.
    pub fn poll(&mut self) -> Option<FilterSnapshot> {
        let value = self.search.poll_expired(Instant::now())?;
        self.settle_search(value)
    }

    /// Wait for the next emission caused by the search debounce.
    ///
    /// Pends forever while no search input is buffered. Cancellation-safe: dropping the
    /// future (e.g. in `tokio::select!`) keeps the buffered value and its deadline.
    pub async fn tick(&mut self) -> FilterSnapshot {
        loop {
            let value = self.search.fired().await;
            if let Some(snapshot) = self.settle_search(value) {
                return snapshot;
            }
        }
    }

    fn settle_search(&mut self, value: String) -> Option<FilterSnapshot> {
        tracing::debug!(search = %value, "Search input settled");
        if self.settled.search == value {
            return None;
        }
        self.settled.search = value;
        Some(self.emit())
    }

    fn emit(&mut self) -> FilterSnapshot {
        self.emitted += 1;
        let snapshot = self.settled.clone();
        self.tx.send_replace(snapshot.clone());
        tracing::debug!(
            query = %snapshot.cache_key(),
            emission = self.emitted,
            "Filter snapshot emitted"
        );
        snapshot
    }
}
