//! Shared error plumbing and id derivation used across all threadline crates.

pub mod error;
pub mod ids;

pub use {
    error::FromMessage,
    ids::{agent_id_for, unique_id},
};
