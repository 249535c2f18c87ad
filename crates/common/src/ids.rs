//! Deterministic identifiers.
//!
//! Every platform-side identifier (message id, conversation id, author id)
//! maps to exactly one UUID per agent, so persisting the same message twice
//! always targets the same record.

use uuid::Uuid;

/// Derive the agent's own id from its configured name.
#[must_use]
pub fn agent_id_for(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Derive a stable id for `key` scoped to `agent_id`.
///
/// The agent's own id maps to itself.
#[must_use]
pub fn unique_id(agent_id: Uuid, key: &str) -> Uuid {
    if key == agent_id.to_string() {
        return agent_id;
    }
    Uuid::new_v5(&agent_id, key.as_bytes())
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("1234567890")]
    #[case("conversation-42")]
    #[case("")]
    fn same_key_same_id(#[case] key: &str) {
        let agent = agent_id_for("threadline");
        assert_eq!(unique_id(agent, key), unique_id(agent, key));
    }

    #[test]
    fn agents_get_distinct_namespaces() {
        let a = agent_id_for("alpha");
        let b = agent_id_for("beta");
        assert_ne!(a, b);
        assert_ne!(unique_id(a, "42"), unique_id(b, "42"));
    }

    #[test]
    fn agent_key_maps_to_agent() {
        let agent = agent_id_for("threadline");
        assert_eq!(unique_id(agent, &agent.to_string()), agent);
    }
}
