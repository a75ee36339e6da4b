//! # fovea-vault
//!
//! The write planner / merger and the dedup/state store. Turns a write plan
//! into safe, deduplicated filesystem mutations against a markdown vault,
//! and tracks processed asset IDs.
//!
//! The vault itself is the durable source of truth for dedup: every note
//! embeds the IDs of the photos that contributed to it, and scanning those
//! IDs out of the tree is authoritative. The persisted state file is a
//! cache and stats ledger only, safe to delete.

pub mod dedup;
pub mod frontmatter;
pub mod paths;
pub mod state;
pub mod writer;

pub use frontmatter::Frontmatter;
pub use state::{PersistentState, StateStore};
pub use writer::VaultWriter;
