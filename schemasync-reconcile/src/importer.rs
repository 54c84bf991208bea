//! Ontology importer collaborator.
//!
//! The importer turns a vocabulary source (RDF file or URL) into stored
//! classes and properties. The reconciler only decides *when* to import or
//! upgrade; parsing and member creation belong to the importer.

use crate::error::ImportResult;
use schemasync_model::{ImportOptions, SourceStrategy, VocabularyDefinition};
use schemasync_types::RecordId;
use serde::{Deserialize, Serialize};

/// Vocabulary metadata and source handed to [`OntologyImporter::import`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyDescriptor {
    pub namespace_uri: String,
    pub prefix: String,
    pub label: String,
    pub comment: Option<String>,
    pub source_location: String,
}

impl From<&VocabularyDefinition> for VocabularyDescriptor {
    fn from(definition: &VocabularyDefinition) -> Self {
        Self {
            namespace_uri: definition.namespace_uri.clone(),
            prefix: definition.prefix.clone(),
            label: definition.label.clone(),
            comment: definition.comment.clone(),
            source_location: definition.source_location.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
}

/// One class or property the source adds or changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberChange {
    pub change: ChangeKind,
    pub local_name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Difference between a vocabulary source and the stored members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyDiff {
    #[serde(default)]
    pub classes: Vec<MemberChange>,
    #[serde(default)]
    pub properties: Vec<MemberChange>,
}

impl OntologyDiff {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.properties.len()
    }
}

/// Imports and upgrades vocabularies.
pub trait OntologyImporter: Send + Sync {
    /// Imports a new vocabulary with all its members. Returns the id of the
    /// created vocabulary record.
    fn import(
        &self,
        strategy: SourceStrategy,
        descriptor: &VocabularyDescriptor,
        options: &ImportOptions,
    ) -> ImportResult<RecordId>;

    /// Compares the source against the stored members of `namespace_uri`.
    fn get_diff(
        &self,
        strategy: SourceStrategy,
        source_location: &str,
        namespace_uri: &str,
        options: &ImportOptions,
    ) -> ImportResult<OntologyDiff>;

    /// Applies a diff to a stored vocabulary.
    fn update(&self, vocabulary_id: RecordId, diff: &OntologyDiff) -> ImportResult<()>;
}
