//! Record and desired-state model for schemasync.
//!
//! Defines the types every other crate depends on:
//! - [`Record`]: a snapshot of one record read from the live store
//! - [`VocabularyDefinition`], [`ResourceTemplateDefinition`],
//!   [`CustomVocabDefinition`]: desired-state documents, read once per pass
//! - [`MemberRef`]: a reference to a vocabulary member by id or by
//!   namespace and local name
//! - [`RecordRef`] and [`normalize_reference`]: the single place where
//!   heterogeneous reference shapes become `{"o:id": n}`
//! - [`encoding`]: structured and delimited custom vocab payload encodings
//!
//! Documents are immutable inputs. Nothing in this crate talks to a store.

pub mod encoding;
pub mod keys;

mod custom_vocab;
mod definition;
mod member;
mod record;
mod reference;
mod template;
mod vocabulary;

pub use custom_vocab::{CustomVocabDefinition, CustomVocabRecord, VocabSource};
pub use definition::Definition;
pub use member::{MemberRef, VocabularyMember};
pub use record::Record;
pub use reference::{canonicalize_refs, normalize_reference, normalize_references, RecordRef};
pub use template::{
    DataBlock, DataTypeEntry, DataTypeName, PropertyBinding, ResourceTemplateDefinition,
};
pub use vocabulary::{
    ImportOptions, RenameMap, SourceStrategy, VocabularyDefinition, VocabularyRecord,
};
