//! Non-destructive merges for schemasync.
//!
//! This crate turns "what the store has" plus "what the document wants" into
//! the full payload to write back:
//!
//! - [`merge_template`]: ordered, keyed merge of resource template property
//!   bindings, with data-type union and resolved-id deduplication
//! - [`build_update_payload`]: the three mutually exclusive custom vocab
//!   sources (item set, URI map, term list) in strict priority order
//!
//! Both merges only add or override what the incoming document states; data
//! present only in the store survives. Both are idempotent: merging the same
//! incoming document into the result again yields the result unchanged.

mod template;
mod terms;

pub use template::{
    merge_binding, merge_blocks, merge_template, union_data_types, MergedTemplate,
};
pub use terms::{build_update_payload, merge_terms, merge_uris, CustomVocabPayload, TermBranch};
