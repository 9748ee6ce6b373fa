//! crates/scrollnet_core/src/memory.rs
//!
//! HashMap-backed persistence backend for tests and local development.
//!
//! Mirrors the Postgres semantics: active-only, newest-first listing, one
//! interaction row per (identity, video, type), insert-only feedback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::{
    FeedbackWrite, InteractionType, InteractionWrite, StoreIdentity, VideoDescriptor,
};
use crate::ports::{PersistenceBackend, PortError, PortResult};

type InteractionKey = (StoreIdentity, String, InteractionType);

#[derive(Debug, Clone)]
struct StoredVideo {
    video: VideoDescriptor,
    created_at: DateTime<Utc>,
    active: bool,
}

#[derive(Default)]
struct Tables {
    videos: Vec<StoredVideo>,
    interactions: HashMap<InteractionKey, InteractionWrite>,
    feedback: Vec<FeedbackWrite>,
}

/// In-memory persistence backend. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<Tables>>,
    offline: Arc<AtomicBool>,
    cadence: NonZeroU32,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_cadence(crate::cadence::DEFAULT_CADENCE)
    }

    /// A backend whose server-side cadence check fires after `cadence` videos.
    pub fn with_cadence(cadence: NonZeroU32) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            offline: Arc::new(AtomicBool::new(false)),
            cadence,
        }
    }

    /// Adds an active video created at `created_at`.
    pub fn insert_video(&self, video: VideoDescriptor, created_at: DateTime<Utc>) {
        self.write_tables(|t| {
            t.videos.push(StoredVideo {
                video,
                created_at,
                active: true,
            })
        });
    }

    /// Soft-deletes a video; it disappears from every listing.
    pub fn deactivate_video(&self, video_id: &str) -> bool {
        self.write_tables(|t| {
            let mut found = false;
            for stored in t.videos.iter_mut().filter(|s| s.video.id == video_id) {
                stored.active = false;
                found = true;
            }
            found
        })
    }

    /// While offline every port call fails with `PortError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn interactions(&self) -> Vec<InteractionWrite> {
        self.read_tables(|t| {
            let mut rows: Vec<_> = t.interactions.values().cloned().collect();
            rows.sort_by(|a, b| (&a.video_id, a.kind).cmp(&(&b.video_id, b.kind)));
            rows
        })
    }

    pub fn interaction(
        &self,
        identity: StoreIdentity,
        video_id: &str,
        kind: InteractionType,
    ) -> Option<InteractionWrite> {
        self.read_tables(|t| {
            t.interactions
                .get(&(identity, video_id.to_string(), kind))
                .cloned()
        })
    }

    pub fn feedback(&self) -> Vec<FeedbackWrite> {
        self.read_tables(|t| t.feedback.clone())
    }

    fn ensure_online(&self) -> PortResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(PortError::Unavailable("in-memory backend is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn read_tables<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        match self.tables.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        match self.tables.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl PersistenceBackend for InMemoryBackend {
    async fn list_videos(&self, offset: usize, limit: usize) -> PortResult<Vec<VideoDescriptor>> {
        self.ensure_online()?;
        Ok(self.read_tables(|t| {
            let mut active: Vec<&StoredVideo> = t.videos.iter().filter(|s| s.active).collect();
            active.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.video.id.cmp(&a.video.id))
            });
            active
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|s| s.video.clone())
                .collect()
        }))
    }

    async fn upsert_interaction(&self, write: InteractionWrite) -> PortResult<()> {
        self.ensure_online()?;
        self.write_tables(|t| {
            let key = (write.identity, write.video_id.clone(), write.kind);
            t.interactions.insert(key, write);
        });
        Ok(())
    }

    async fn insert_feedback(&self, write: FeedbackWrite) -> PortResult<()> {
        self.ensure_online()?;
        self.write_tables(|t| t.feedback.push(write));
        Ok(())
    }

    async fn feedback_required(&self, identity: StoreIdentity) -> PortResult<bool> {
        self.ensure_online()?;
        let cadence = self.cadence.get() as usize;
        Ok(self.read_tables(|t| {
            let since = t
                .feedback
                .iter()
                .filter(|f| f.identity == identity)
                .map(|f| f.created_at)
                .max();
            let videos: HashSet<&str> = t
                .interactions
                .values()
                .filter(|i| i.identity == identity)
                .filter(|i| since.map_or(true, |since| i.created_at > since))
                .map(|i| i.video_id.as_str())
                .collect();
            videos.len() >= cadence
        }))
    }
}
