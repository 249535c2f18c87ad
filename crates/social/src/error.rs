#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Looking up an ancestor message failed.
    #[error("failed to fetch message {message_id}: {source}")]
    Fetch {
        message_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// A single chunk could not be published or its response not understood.
    #[error("failed to publish chunk {chunk_index}: {reason}")]
    Publish { chunk_index: usize, reason: String },

    /// A media attachment is neither a reachable URL nor an existing file.
    #[error("cannot resolve media {url}: {reason}")]
    MediaResolution { url: String, reason: String },

    #[error("model invocation failed: {source}")]
    ModelInvocation {
        #[source]
        source: anyhow::Error,
    },

    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error(transparent)]
    Store(#[from] threadline_memory::Error),
}

impl Error {
    #[must_use]
    pub fn fetch(message_id: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Fetch {
            message_id: message_id.into(),
            source,
        }
    }

    #[must_use]
    pub fn publish(chunk_index: usize, reason: impl Into<String>) -> Self {
        Self::Publish {
            chunk_index,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn media(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MediaResolution {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
