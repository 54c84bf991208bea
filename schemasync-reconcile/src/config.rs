use schemasync_model::encoding::PayloadEncoding;
use schemasync_model::ImportOptions;
use serde::{Deserialize, Serialize};

/// What to do with a document whose record already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingPolicy {
    /// Merge the document into the stored record.
    #[default]
    Update,
    /// Leave the stored record alone and report `SkippedExisting`.
    Skip,
}

/// Configuration for the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub on_existing_vocabulary: ExistingPolicy,
    pub on_existing_template: ExistingPolicy,
    pub on_existing_custom_vocab: ExistingPolicy,
    /// Encoding for new custom vocabs, and for stored ones that give no hint.
    pub custom_vocab_encoding: PayloadEncoding,
    /// Importer options; per-document options override these field by field.
    pub import: ImportOptions,
    /// Redirect references and delete the old member when a rename collides.
    /// When false the collision is only reported.
    pub rewrite_references: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            on_existing_vocabulary: ExistingPolicy::Update,
            on_existing_template: ExistingPolicy::Update,
            on_existing_custom_vocab: ExistingPolicy::Update,
            custom_vocab_encoding: PayloadEncoding::Structured,
            import: ImportOptions::default(),
            rewrite_references: true,
        }
    }
}
