use std::time::Duration;

use {
    chrono::Utc,
    rand::Rng,
    threadline_config::{PlatformConfig, PublishConfig},
    threadline_memory::{MemoryRecord, MemoryStore, create_if_absent},
    tracing::{debug, info, warn},
    uuid::Uuid,
};

use crate::{
    error::{Error, Result},
    media::fetch_media_data,
    platform::{PlatformClient, PostVariant},
    segment::{dedupe_leading_mentions, segment},
    types::{AgentProfile, Content, MediaAttachment, MediaData, PublishedPost},
};

// Handle-less permalink path the platform resolves for any account.
const ANONYMOUS_HANDLE: &str = "i";

/// Sleep for a uniformly random number of milliseconds in `[min_ms, max_ms]`.
pub async fn random_delay(min_ms: u64, max_ms: u64) {
    let (lo, hi) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    let ms = rand::rng().random_range(lo..=hi);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Publishes chunk sequences as reply chains.
pub struct Publisher<'a> {
    platform: &'a dyn PlatformClient,
    store: &'a dyn MemoryStore,
    profile: &'a AgentProfile,
    http: reqwest::Client,
    post_limit: usize,
    delay_min_ms: u64,
    delay_max_ms: u64,
}

impl<'a> Publisher<'a> {
    pub fn new(
        platform: &'a dyn PlatformClient,
        store: &'a dyn MemoryStore,
        profile: &'a AgentProfile,
        platform_config: &PlatformConfig,
        publish_config: &PublishConfig,
    ) -> Self {
        Self {
            platform,
            store,
            profile,
            http: reqwest::Client::new(),
            post_limit: platform_config.post_limit,
            delay_min_ms: publish_config.delay_min_ms,
            delay_max_ms: publish_config.delay_max_ms,
        }
    }

    /// Use `client` for downloading remote media.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Submit `chunks` one after another, each replying to the previous
    /// chunk that was accepted (the first replies to `reply_to`).
    ///
    /// Media are resolved before anything is sent and ride on the first
    /// chunk. Chunks that are blank after trimming are not sent. A chunk the
    /// platform rejects is logged and skipped; the next chunk replies to the
    /// last accepted one instead.
    pub async fn publish(
        &self,
        chunks: &[String],
        attachments: &[MediaAttachment],
        reply_to: Option<&str>,
        variant: PostVariant,
    ) -> Result<Vec<PublishedPost>> {
        let media = if attachments.is_empty() {
            Vec::new()
        } else {
            fetch_media_data(&self.http, attachments).await?
        };

        info!(
            chunks = chunks.len(),
            media = media.len(),
            ?variant,
            reply_to,
            "publishing"
        );

        let mut parent = reply_to.map(str::to_string);
        let mut published = Vec::with_capacity(chunks.len());
        let mut submitted = 0_usize;

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let text = dedupe_leading_mentions(chunk.trim());
            if text.is_empty() {
                debug!(chunk_index, "skipping blank chunk");
                continue;
            }
            let chunk_media: &[MediaData] = if submitted == 0 {
                &media
            } else {
                &[]
            };
            submitted += 1;
            let reply_target = parent.as_deref();

            let outcome = self
                .platform
                .request_queue()
                .add(|| variant.submit(self.platform, &text, reply_target, chunk_media))
                .await;

            match self.accept(chunk_index, variant, outcome, reply_target) {
                Ok(post) => {
                    debug!(chunk_index, post_id = %post.id, "chunk published");
                    parent = Some(post.id.clone());
                    published.push(post);
                },
                Err(e) => {
                    warn!(error = %e, chunk = %text, "skipping chunk");
                },
            }

            random_delay(self.delay_min_ms, self.delay_max_ms).await;
        }

        Ok(published)
    }

    fn accept(
        &self,
        chunk_index: usize,
        variant: PostVariant,
        outcome: anyhow::Result<serde_json::Value>,
        reply_target: Option<&str>,
    ) -> Result<PublishedPost> {
        let body = outcome.map_err(|e| Error::publish(chunk_index, e.to_string()))?;
        let created = variant
            .parse_response(&body)
            .ok_or_else(|| Error::publish(chunk_index, format!("unexpected response: {body}")))?;
        Ok(PublishedPost {
            memory_id: self.profile.memory_id(&created.id),
            id: created.id,
            text: created.text,
            conversation_id: created.conversation_id,
            parent_id: reply_target.map(str::to_string),
            timestamp: created
                .timestamp
                .unwrap_or_else(|| Utc::now().timestamp()),
        })
    }

    /// Split `content` to the post limit, publish it, and record each
    /// accepted post as a memory authored by the agent in `room_id`.
    ///
    /// Permanent links use `author_name`, else the configured agent handle.
    /// Content longer than the post limit goes out as long-form posts.
    /// Persisting is idempotent and a failed write is only logged, so the
    /// returned records always match what the platform accepted.
    pub async fn publish_content(
        &self,
        content: &Content,
        room_id: Uuid,
        author_name: Option<&str>,
        reply_to: Option<&str>,
    ) -> Result<Vec<MemoryRecord>> {
        let author_name = author_name
            .or(self.profile.username.as_deref())
            .unwrap_or(ANONYMOUS_HANDLE);
        let variant = PostVariant::for_content(&content.text, self.post_limit);
        let chunks = segment(&content.text, self.post_limit);
        let posts = self
            .publish(&chunks, &content.attachments, reply_to, variant)
            .await?;

        let mut records = Vec::with_capacity(posts.len());
        for post in &posts {
            let record = self.profile.published_record(post, room_id, author_name);
            if let Err(e) = create_if_absent(self.store, record.clone()).await {
                warn!(memory_id = %record.id, error = %e, "failed to persist published post");
            }
            records.push(record);
        }

        info!(
            chunks = chunks.len(),
            published = records.len(),
            "publish finished"
        );
        Ok(records)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, tokio::time::Instant};

    #[tokio::test(start_paused = true)]
    async fn random_delay_stays_in_range() {
        for _ in 0..20 {
            let start = Instant::now();
            random_delay(1_000, 3_000).await;
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(1_000), "{elapsed:?}");
            assert!(elapsed <= Duration::from_millis(3_010), "{elapsed:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn random_delay_accepts_swapped_and_zero_bounds() {
        let start = Instant::now();
        random_delay(0, 0).await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        let start = Instant::now();
        random_delay(50, 10).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(10) && elapsed <= Duration::from_millis(60));
    }
}
