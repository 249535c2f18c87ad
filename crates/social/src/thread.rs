use std::collections::{HashSet, VecDeque};

use {
    threadline_config::ThreadConfig,
    threadline_memory::{MemoryStore, create_if_absent},
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    platform::PlatformClient,
    types::{AgentProfile, MessageNode},
};

/// Reconstructs the reply ancestry of a message and records every message
/// it sees.
pub struct ThreadWalker<'a> {
    platform: &'a dyn PlatformClient,
    store: &'a dyn MemoryStore,
    profile: &'a AgentProfile,
    max_depth: usize,
}

impl<'a> ThreadWalker<'a> {
    pub fn new(
        platform: &'a dyn PlatformClient,
        store: &'a dyn MemoryStore,
        profile: &'a AgentProfile,
        config: &ThreadConfig,
    ) -> Self {
        Self {
            platform,
            store,
            profile,
            max_depth: config.max_depth,
        }
    }

    /// Walk parent links upward from `seed` and return the thread ordered
    /// root first, seed last.
    ///
    /// The seed sits at depth 0 and at most `thread.max_depth` ancestors are
    /// followed. A failed or empty parent lookup ends the walk and whatever
    /// was collected so far is returned. Revisiting an id (a reply cycle)
    /// also ends the walk.
    pub async fn build(&self, seed: Option<MessageNode>) -> Vec<MessageNode> {
        let max_depth = self.max_depth;
        let Some(seed) = seed else {
            debug!("no seed message, empty thread");
            return Vec::new();
        };

        let mut thread = VecDeque::new();
        let mut visited = HashSet::new();
        let mut current = seed;
        let mut depth = 0;

        loop {
            if !visited.insert(current.id.clone()) {
                debug!(message_id = %current.id, depth, "already visited, stopping");
                break;
            }
            debug!(
                message_id = %current.id,
                parent_id = current.parent_id.as_deref(),
                depth,
                "processing message"
            );

            if let Err(e) = self.remember(&current).await {
                warn!(message_id = %current.id, error = %e, "failed to persist thread message");
            }

            let parent_id = current.parent_id.clone();
            thread.push_front(current);

            let Some(parent_id) = parent_id else {
                debug!(depth, "reached root of reply chain");
                break;
            };
            if depth >= max_depth {
                debug!(depth, max_depth, "reached maximum depth");
                break;
            }
            if visited.contains(&parent_id) {
                debug!(message_id = %parent_id, depth, "parent already visited, stopping");
                break;
            }

            match self.platform.get_message(&parent_id).await {
                Ok(Some(parent)) => {
                    current = parent;
                    depth += 1;
                },
                Ok(None) => {
                    debug!(message_id = %parent_id, "parent message not found");
                    break;
                },
                Err(source) => {
                    let err = Error::fetch(parent_id, source);
                    warn!(error = %err, depth, "stopping thread walk");
                    break;
                },
            }
        }

        debug!(
            length = thread.len(),
            ids = ?thread.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            "thread built"
        );
        thread.into()
    }

    /// Ensure the author is joined to the conversation room and the message
    /// is stored. Returns `true` when a new record was written.
    async fn remember(&self, node: &MessageNode) -> Result<bool> {
        let record = self.profile.message_record(node);
        if self.store.get_by_id(record.id).await?.is_some() {
            return Ok(false);
        }
        self.store
            .ensure_connection(&self.profile.connection_for(node))
            .await?;
        Ok(create_if_absent(self.store, record).await?)
    }
}

/// [`ThreadWalker::build`] with an explicit depth bound.
pub async fn build_thread(
    platform: &dyn PlatformClient,
    store: &dyn MemoryStore,
    profile: &AgentProfile,
    seed: Option<MessageNode>,
    max_depth: usize,
) -> Vec<MessageNode> {
    ThreadWalker::new(platform, store, profile, &ThreadConfig { max_depth })
        .build(seed)
        .await
}
