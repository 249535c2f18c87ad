use {
    async_trait::async_trait,
    chrono::DateTime,
    serde::Deserialize,
    tokio::sync::Mutex,
};

use crate::{
    segment::weighted_len,
    types::{MediaData, MessageNode},
};

/// Platform response date format, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const PLATFORM_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Network side of the platform. Implementations own authentication and
/// transport; this crate only sequences calls and interprets responses.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch one message. `Ok(None)` when the platform has no such message.
    async fn get_message(&self, id: &str) -> anyhow::Result<Option<MessageNode>>;

    /// Submit a standard post and return the raw response body.
    async fn send_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media: &[MediaData],
    ) -> anyhow::Result<serde_json::Value>;

    /// Submit a long-form post and return the raw response body.
    async fn send_long_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media: &[MediaData],
    ) -> anyhow::Result<serde_json::Value>;

    /// Queue every submission goes through.
    fn request_queue(&self) -> &RequestQueue;
}

/// FIFO single-flight queue: at most one request runs at a time, and
/// waiters run in the order they arrived.
#[derive(Debug, Default)]
pub struct RequestQueue {
    slot: Mutex<()>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `request` once every earlier request has finished.
    pub async fn add<F, Fut, T>(&self, request: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _slot = self.slot.lock().await;
        request().await
    }
}

/// Which submission endpoint a batch uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostVariant {
    Standard,
    LongForm,
}

impl PostVariant {
    /// Long-form when the unsplit content would not fit a standard post.
    #[must_use]
    pub fn for_content(text: &str, post_limit: usize) -> Self {
        if weighted_len(text) > post_limit {
            Self::LongForm
        } else {
            Self::Standard
        }
    }

    fn result_pointer(self) -> &'static str {
        match self {
            Self::Standard => "/data/create_tweet/tweet_results/result",
            Self::LongForm => "/data/notetweet_create/tweet_results/result",
        }
    }

    pub(crate) async fn submit(
        self,
        platform: &dyn PlatformClient,
        text: &str,
        reply_to: Option<&str>,
        media: &[MediaData],
    ) -> anyhow::Result<serde_json::Value> {
        match self {
            Self::Standard => platform.send_post(text, reply_to, media).await,
            Self::LongForm => platform.send_long_post(text, reply_to, media).await,
        }
    }

    /// Extract the created post from a response body. `None` when the body
    /// does not have the shape this variant produces.
    pub fn parse_response(self, body: &serde_json::Value) -> Option<CreatedPost> {
        let result = body.pointer(self.result_pointer())?;
        let raw = RawPostResult::deserialize(result).ok()?;
        let timestamp = raw
            .legacy
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_str(s, PLATFORM_DATE_FORMAT).ok())
            .map(|dt| dt.timestamp());
        Some(CreatedPost {
            id: raw.rest_id,
            text: raw.legacy.full_text,
            conversation_id: raw.legacy.conversation_id_str,
            timestamp,
        })
    }
}

/// Fields the publisher needs from a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPost {
    pub id: String,
    pub text: String,
    pub conversation_id: Option<String>,
    /// Unix seconds, if the platform's date parsed.
    pub timestamp: Option<i64>,
}

#[derive(Deserialize)]
struct RawPostResult {
    rest_id: String,
    legacy: RawLegacy,
}

#[derive(Deserialize)]
struct RawLegacy {
    full_text: String,
    #[serde(default)]
    conversation_id_str: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::json,
        std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    fn body(key: &str) -> serde_json::Value {
        json!({
            "data": {
                key: {
                    "tweet_results": {
                        "result": {
                            "rest_id": "1850",
                            "legacy": {
                                "full_text": "hello",
                                "conversation_id_str": "1700",
                                "created_at": "Wed Oct 10 20:19:24 +0000 2018"
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn parses_standard_response() {
        let post = PostVariant::Standard
            .parse_response(&body("create_tweet"))
            .unwrap();
        assert_eq!(post.id, "1850");
        assert_eq!(post.text, "hello");
        assert_eq!(post.conversation_id.as_deref(), Some("1700"));
        assert_eq!(post.timestamp, Some(1_539_202_764));
    }

    #[test]
    fn parses_long_form_response() {
        let post = PostVariant::LongForm
            .parse_response(&body("notetweet_create"))
            .unwrap();
        assert_eq!(post.id, "1850");
    }

    #[test]
    fn variant_mismatch_is_unparsable() {
        assert!(
            PostVariant::Standard
                .parse_response(&body("notetweet_create"))
                .is_none()
        );
        assert!(
            PostVariant::Standard
                .parse_response(&json!({"errors": [{"message": "rate limited"}]}))
                .is_none()
        );
    }

    #[test]
    fn bad_date_leaves_timestamp_empty() {
        let mut b = body("create_tweet");
        b["data"]["create_tweet"]["tweet_results"]["result"]["legacy"]["created_at"] =
            json!("yesterday");
        let post = PostVariant::Standard.parse_response(&b).unwrap();
        assert_eq!(post.timestamp, None);
    }

    #[test]
    fn variant_follows_post_limit() {
        assert_eq!(PostVariant::for_content("short", 279), PostVariant::Standard);
        assert_eq!(
            PostVariant::for_content(&"a".repeat(279), 279),
            PostVariant::Standard
        );
        assert_eq!(
            PostVariant::for_content(&"a".repeat(280), 279),
            PostVariant::LongForm
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn queue_runs_one_request_at_a_time_in_arrival_order() {
        let queue = Arc::new(RequestQueue::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let queue = Arc::clone(&queue);
            let in_flight = Arc::clone(&in_flight);
            let max_in_flight = Arc::clone(&max_in_flight);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                queue
                    .add(|| async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_in_flight.fetch_max(now, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        order.lock().unwrap().push(i);
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
            // Let the task reach the queue before spawning the next one.
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }
}
