//! Reading the day feed

use crate::application::refresh::RefreshToken;
use crate::domain::{EntryFilter, EntryWithDetails, UserId};
use crate::error::Result;
use crate::infrastructure::deadline::within;
use crate::infrastructure::{Backend, RecordStore};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Joined read of entries with their author profile and images
#[derive(Clone)]
pub struct FeedLoader {
    records: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl FeedLoader {
    pub fn new(backend: &Backend) -> Self {
        FeedLoader {
            records: backend.records.clone(),
            timeout: backend.timeout,
        }
    }

    /// Entries matching `filter`, newest first
    pub async fn load(&self, filter: &EntryFilter) -> Result<Vec<EntryWithDetails>> {
        let mut entries = within(self.timeout, "select entries", self.records.select_entries(filter))
            .await?;
        // Stable, so equal timestamps keep the store's order
        entries.sort_by(|a, b| b.entry.created_at.cmp(&a.entry.created_at));
        debug!(count = entries.len(), "feed loaded");
        Ok(entries)
    }

    pub async fn load_day(&self, date: NaiveDate) -> Result<Vec<EntryWithDetails>> {
        self.load(&EntryFilter::on(date)).await
    }
}

/// Feed for a selected day that re-reads only when the day or the refresh
/// token changes
#[derive(Debug, Clone, Default)]
pub struct FeedView {
    owner: Option<UserId>,
    shown: Option<(NaiveDate, RefreshToken)>,
    entries: Vec<EntryWithDetails>,
}

impl FeedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only show entries written by `owner`
    pub fn mine(owner: UserId) -> Self {
        FeedView {
            owner: Some(owner),
            ..Self::default()
        }
    }

    /// Bring the view up to date. Returns whether the store was read.
    ///
    /// On a failed read the view is left empty and the next sync reads again.
    pub async fn sync(&mut self, loader: &FeedLoader, date: NaiveDate, token: RefreshToken) -> Result<bool> {
        if self.shown == Some((date, token)) {
            return Ok(false);
        }

        let mut filter = EntryFilter::on(date);
        if let Some(owner) = self.owner {
            filter = filter.owned_by(owner);
        }

        match loader.load(&filter).await {
            Ok(entries) => {
                self.entries = entries;
                self.shown = Some((date, token));
                Ok(true)
            }
            Err(e) => {
                warn!(date = %date, error = %e, "feed read failed");
                self.entries.clear();
                self.shown = None;
                Err(e)
            }
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.shown.map(|(date, _)| date)
    }

    pub fn entries(&self) -> &[EntryWithDetails] {
        &self.entries
    }
}
