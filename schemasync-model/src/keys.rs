//! JSON keys used in store payloads.
//!
//! Records follow a JSON-LD flavoured layout where every engine-owned key is
//! prefixed with `o:`. Keys not listed here are opaque and carried through
//! merges untouched.

/// Canonical reference key: `{"o:id": 12}`.
pub const ID: &str = "o:id";

/// Alternative identifier keys accepted on input.
pub const PLAIN_ID: &str = "id";
pub const LD_ID: &str = "@id";

// =============================================================================
// Vocabularies and members
// =============================================================================

pub const NAMESPACE_URI: &str = "o:namespace_uri";
pub const PREFIX: &str = "o:prefix";
pub const LABEL: &str = "o:label";
pub const COMMENT: &str = "o:comment";
pub const LOCAL_NAME: &str = "o:local_name";
pub const VOCABULARY: &str = "o:vocabulary";

// =============================================================================
// Resource templates
// =============================================================================

pub const RESOURCE_CLASS: &str = "o:resource_class";
pub const TITLE_PROPERTY: &str = "o:title_property";
pub const DESCRIPTION_PROPERTY: &str = "o:description_property";
pub const TEMPLATE_PROPERTIES: &str = "o:resource_template_property";
pub const PROPERTY: &str = "o:property";
pub const DATA_TYPE: &str = "o:data_type";
pub const DATA: &str = "o:data";

/// Keys of a data-type entry inside a data block.
pub const DATA_TYPE_NAME: &str = "name";
pub const DATA_TYPE_LABEL: &str = "label";

// =============================================================================
// Custom vocabs
// =============================================================================

pub const LANG: &str = "o:lang";
pub const ITEM_SET: &str = "o:item_set";
pub const TERMS: &str = "o:terms";
pub const URIS: &str = "o:uris";

// =============================================================================
// Resources (items, item sets, media)
// =============================================================================

pub const VALUES: &str = "o:values";
pub const TITLE: &str = "o:title";
