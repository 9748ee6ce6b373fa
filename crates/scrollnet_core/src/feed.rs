//! crates/scrollnet_core/src/feed.rs
//!
//! The feed cursor: an ordered, paginated walk over active videos that never
//! leaves the screen blank.

use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::VideoDescriptor;
use crate::ports::{DegradedEvent, PersistenceBackend, TelemetrySink};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One fetched page. `degraded` marks the built-in placeholder set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub videos: Vec<VideoDescriptor>,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub video: VideoDescriptor,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStep {
    Video(FeedItem),
    EndOfFeed,
}

impl FeedStep {
    pub fn item(&self) -> Option<&FeedItem> {
        match self {
            FeedStep::Video(item) => Some(item),
            FeedStep::EndOfFeed => None,
        }
    }
}

/// Sample content shown when the backend cannot be reached.
pub fn placeholder_videos() -> Vec<VideoDescriptor> {
    [
        (
            "placeholder-1",
            "Welcome to ScrollNet",
            "Swipe right to like, left to pass, up to skip.",
        ),
        (
            "placeholder-2",
            "Tap to pause",
            "Tap anywhere on a video to pause or resume playback.",
        ),
        (
            "placeholder-3",
            "React with emoji",
            "Use the reaction bar to tell us how a video made you feel.",
        ),
    ]
    .into_iter()
    .map(|(id, title, description)| VideoDescriptor {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        source_url: format!("https://cdn.scrollnet.app/samples/{id}.mp4"),
        duration_seconds: 15,
        tags: vec!["sample".to_string()],
        thumbnail_url: Some(format!("https://cdn.scrollnet.app/samples/{id}.jpg")),
    })
    .collect()
}

pub struct FeedCursor {
    backend: Arc<dyn PersistenceBackend>,
    telemetry: Arc<dyn TelemetrySink>,
    page_size: usize,
    buffer: VecDeque<FeedItem>,
    /// Offset of the next real page to request.
    next_offset: usize,
    exhausted: bool,
    position: usize,
    videos_consumed: usize,
}

impl FeedCursor {
    pub fn new(
        backend: Arc<dyn PersistenceBackend>,
        telemetry: Arc<dyn TelemetrySink>,
        page_size: usize,
    ) -> Self {
        Self {
            backend,
            telemetry,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            next_offset: 0,
            exhausted: false,
            position: 0,
            videos_consumed: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn videos_consumed(&self) -> usize {
        self.videos_consumed
    }

    /// Fetches one page directly. Never fails: a backend error yields the
    /// placeholder set flagged as degraded.
    pub async fn fetch_page(&self, offset: usize, limit: usize) -> FeedPage {
        match self.backend.list_videos(offset, limit).await {
            Ok(videos) => FeedPage {
                videos,
                degraded: false,
            },
            Err(e) => {
                self.telemetry.record(DegradedEvent::FeedFallback {
                    offset,
                    reason: e.to_string(),
                });
                FeedPage {
                    videos: placeholder_videos(),
                    degraded: true,
                }
            }
        }
    }

    /// The video at the current position, fetching a page if the buffer is empty.
    pub async fn current(&mut self) -> FeedStep {
        if self.buffer.is_empty() && !self.exhausted {
            self.fill().await;
        }
        match self.buffer.front() {
            Some(item) => FeedStep::Video(item.clone()),
            None => FeedStep::EndOfFeed,
        }
    }

    /// Moves past the on-screen video and returns the next one.
    pub async fn advance(&mut self) -> FeedStep {
        if let FeedStep::EndOfFeed = self.current().await {
            return FeedStep::EndOfFeed;
        }
        self.buffer.pop_front();
        self.position += 1;
        self.videos_consumed += 1;
        self.current().await
    }

    /// Drops everything buffered and restarts from the newest video.
    pub async fn refresh(&mut self) -> FeedStep {
        info!(consumed = self.videos_consumed, "refreshing feed");
        self.buffer.clear();
        self.next_offset = 0;
        self.exhausted = false;
        self.position = 0;
        self.current().await
    }

    async fn fill(&mut self) {
        let page = self.fetch_page(self.next_offset, self.page_size).await;
        if page.degraded {
            // The real offset stays put so the next fill retries the backend.
            self.buffer.extend(page.videos.into_iter().map(|video| FeedItem {
                video,
                degraded: true,
            }));
            return;
        }

        debug!(offset = self.next_offset, count = page.videos.len(), "fetched feed page");
        if page.videos.is_empty() {
            self.exhausted = true;
            return;
        }
        self.next_offset += page.videos.len();
        self.buffer.extend(page.videos.into_iter().map(|video| FeedItem {
            video,
            degraded: false,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::telemetry::RecordingTelemetry;
    use chrono::{Duration, Utc};

    fn video(id: &str) -> VideoDescriptor {
        VideoDescriptor {
            id: id.to_string(),
            title: id.to_uppercase(),
            description: String::new(),
            source_url: format!("https://cdn.example.com/{id}.mp4"),
            duration_seconds: 20,
            tags: vec!["test".to_string()],
            thumbnail_url: None,
        }
    }

    /// `count` videos, `v1` newest.
    fn seeded(count: usize) -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        let now = Utc::now();
        for i in 1..=count {
            backend.insert_video(video(&format!("v{i}")), now - Duration::seconds(i as i64));
        }
        backend
    }

    fn cursor(backend: &InMemoryBackend, page_size: usize) -> (FeedCursor, RecordingTelemetry) {
        let telemetry = RecordingTelemetry::new();
        (
            FeedCursor::new(Arc::new(backend.clone()), Arc::new(telemetry.clone()), page_size),
            telemetry,
        )
    }

    fn id_of(step: &FeedStep) -> Option<&str> {
        step.item().map(|item| item.video.id.as_str())
    }

    #[tokio::test]
    async fn repeated_fetch_returns_identical_order() {
        let backend = seeded(12);
        let (cursor, _) = cursor(&backend, 10);
        let first = cursor.fetch_page(0, 10).await;
        let second = cursor.fetch_page(0, 10).await;
        assert!(!first.degraded);
        assert_eq!(first.videos.len(), 10);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn advance_walks_across_pages_then_ends() {
        let backend = seeded(5);
        let (mut cursor, _) = cursor(&backend, 2);

        let mut seen = vec![id_of(&cursor.current().await).map(str::to_string)];
        for _ in 0..5 {
            seen.push(id_of(&cursor.advance().await).map(str::to_string));
        }

        let expected: Vec<Option<String>> = ["v1", "v2", "v3", "v4", "v5"]
            .iter()
            .map(|s| Some(s.to_string()))
            .chain(std::iter::once(None))
            .collect();
        assert_eq!(seen, expected);
        assert_eq!(cursor.position(), 5);
        assert_eq!(cursor.videos_consumed(), 5);

        // Further advances at the end change nothing.
        assert_eq!(cursor.advance().await, FeedStep::EndOfFeed);
        assert_eq!(cursor.videos_consumed(), 5);
    }

    #[tokio::test]
    async fn empty_store_is_end_of_feed() {
        let backend = InMemoryBackend::new();
        let (mut cursor, telemetry) = cursor(&backend, 10);
        assert_eq!(cursor.current().await, FeedStep::EndOfFeed);
        assert!(telemetry.events().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_serves_flagged_placeholders() {
        let backend = seeded(3);
        backend.set_offline(true);
        let (cursor, telemetry) = cursor(&backend, 10);

        let page = cursor.fetch_page(0, 10).await;
        assert!(page.degraded);
        assert!(!page.videos.is_empty());
        assert_eq!(page.videos, placeholder_videos());
        assert!(matches!(
            telemetry.events().as_slice(),
            [DegradedEvent::FeedFallback { offset: 0, .. }]
        ));
    }

    #[tokio::test]
    async fn cursor_recovers_after_placeholders() {
        let backend = seeded(2);
        backend.set_offline(true);
        let (mut cursor, _) = cursor(&backend, 10);

        let first = cursor.current().await;
        assert!(first.item().unwrap().degraded);

        backend.set_offline(false);
        let mut step = first;
        for _ in 0..placeholder_videos().len() {
            step = cursor.advance().await;
        }
        let item = step.item().unwrap();
        assert!(!item.degraded);
        assert_eq!(item.video.id, "v1");
    }

    #[tokio::test]
    async fn soft_deleted_video_is_skipped() {
        let backend = seeded(3);
        backend.deactivate_video("v2");
        let (mut cursor, _) = cursor(&backend, 10);
        assert_eq!(id_of(&cursor.current().await), Some("v1"));
        assert_eq!(id_of(&cursor.advance().await), Some("v3"));
    }

    #[tokio::test]
    async fn refresh_restarts_but_keeps_consumed_count() {
        let backend = seeded(3);
        let (mut cursor, _) = cursor(&backend, 10);
        cursor.current().await;
        cursor.advance().await;
        let step = cursor.refresh().await;
        assert_eq!(id_of(&step), Some("v1"));
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.videos_consumed(), 1);
    }
}
