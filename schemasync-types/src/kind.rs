//! Record kinds known to the reconciliation engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a record in the live store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Vocabulary,
    ResourceClass,
    Property,
    ResourceTemplate,
    CustomVocab,
    ItemSet,
    Item,
    Media,
}

impl RecordKind {
    /// All kinds, in a stable order.
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Vocabulary,
        RecordKind::ResourceClass,
        RecordKind::Property,
        RecordKind::ResourceTemplate,
        RecordKind::CustomVocab,
        RecordKind::ItemSet,
        RecordKind::Item,
        RecordKind::Media,
    ];

    /// Kinds whose records carry a resource class and property values.
    pub const RESOURCES: [RecordKind; 3] =
        [RecordKind::ItemSet, RecordKind::Item, RecordKind::Media];

    /// Stable snake_case name, also used as the storage discriminator.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::ResourceClass => "resource_class",
            Self::Property => "property",
            Self::ResourceTemplate => "resource_template",
            Self::CustomVocab => "custom_vocab",
            Self::ItemSet => "item_set",
            Self::Item => "item",
            Self::Media => "media",
        }
    }

    /// Returns the member kind if this record kind is a vocabulary member.
    pub const fn as_member(&self) -> Option<MemberKind> {
        match self {
            Self::ResourceClass => Some(MemberKind::Class),
            Self::Property => Some(MemberKind::Property),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| crate::Error::UnknownKind(s.to_string()))
    }
}

/// The two kinds of vocabulary member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Class,
    Property,
}

impl MemberKind {
    /// The record kind that stores members of this kind.
    pub const fn record_kind(&self) -> RecordKind {
        match self {
            Self::Class => RecordKind::ResourceClass,
            Self::Property => RecordKind::Property,
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => f.write_str("class"),
            Self::Property => f.write_str("property"),
        }
    }
}
