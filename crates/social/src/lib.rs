//! Conversation threads and long-form publishing for social platforms.
//!
//! Walks a message's reply ancestry into a root-first thread, splits long
//! generated content into platform-sized posts, publishes those posts as a
//! reply chain, and turns free-form model output into action flags.

pub mod error;
pub mod filter;
pub mod generate;
pub mod intent;
pub mod media;
pub mod platform;
pub mod publish;
pub mod segment;
pub mod thread;
pub mod types;

pub use {
    error::{Error, Result},
    filter::is_valid_message,
    generate::{
        RetryPolicy, TextGenerator, generate_filler, generate_topics_if_empty, generate_with_retry,
    },
    intent::{ActionFlags, parse_action_response},
    media::fetch_media_data,
    platform::{CreatedPost, PlatformClient, PostVariant, RequestQueue},
    publish::{Publisher, random_delay},
    segment::{URL_WEIGHT, dedupe_leading_mentions, segment, weighted_len},
    thread::{ThreadWalker, build_thread},
    types::{AgentProfile, Content, MediaAttachment, MediaData, MessageNode, PublishedPost},
};
