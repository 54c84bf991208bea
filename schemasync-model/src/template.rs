use crate::definition::{check_identity, Definition};
use crate::keys;
use crate::member::MemberRef;
use crate::record::Record;
use crate::reference::{normalize_reference, RecordRef};
use schemasync_types::{RecordId, RecordKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const CUSTOM_VOCAB_PREFIX: &str = "customvocab:";

/// Name of a data type, e.g. `literal`, `uri`, `resource:item` or
/// `customvocab:12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTypeName(String);

impl DataTypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn literal() -> Self {
        Self::new("literal")
    }

    pub fn uri() -> Self {
        Self::new("uri")
    }

    pub fn resource() -> Self {
        Self::new("resource")
    }

    /// `customvocab:<id>`.
    pub fn custom_vocab(id: RecordId) -> Self {
        Self(format!("{CUSTOM_VOCAB_PREFIX}{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// For `customvocab:<label>` names that still need resolving, the label.
    pub fn custom_vocab_label(&self) -> Option<&str> {
        let rest = self.0.strip_prefix(CUSTOM_VOCAB_PREFIX)?;
        let rest = rest.trim();
        if rest.is_empty() || rest.bytes().all(|b| b.is_ascii_digit()) {
            None
        } else {
            Some(rest)
        }
    }

    /// For resolved `customvocab:<id>` names, the id.
    pub fn custom_vocab_id(&self) -> Option<RecordId> {
        self.0
            .strip_prefix(CUSTOM_VOCAB_PREFIX)
            .and_then(|rest| rest.trim().parse::<RecordId>().ok())
    }
}

impl fmt::Display for DataTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataTypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One row of a data block's data-type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DataTypeEntryRepr")]
pub struct DataTypeEntry {
    pub name: DataTypeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DataTypeEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: DataTypeName::new(name),
            label: None,
        }
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(keys::DATA_TYPE_NAME.to_string(), Value::from(self.name.as_str()));
        if let Some(label) = &self.label {
            map.insert(keys::DATA_TYPE_LABEL.to_string(), Value::from(label.as_str()));
        }
        Value::Object(map)
    }

    fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DataTypeEntryRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<DataTypeEntryRepr> for DataTypeEntry {
    fn from(repr: DataTypeEntryRepr) -> Self {
        match repr {
            DataTypeEntryRepr::Name(name) => Self::new(name),
            DataTypeEntryRepr::Full { name, label } => Self {
                name: DataTypeName::new(name),
                label,
            },
        }
    }
}

/// Per-data-type display configuration of a binding.
///
/// `fields` holds everything except the data-type table (alternate label,
/// comment, required/private flags, default values, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataBlock {
    #[serde(default, alias = "o:data_type")]
    pub data_types: Vec<DataTypeEntry>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DataBlock {
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(
            keys::DATA_TYPE.to_string(),
            Value::Array(self.data_types.iter().map(DataTypeEntry::to_value).collect()),
        );
        Value::Object(map)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let mut fields = map.clone();
        let data_types = fields
            .remove(keys::DATA_TYPE)
            .and_then(|v| match v {
                Value::Array(items) => Some(items.iter().filter_map(DataTypeEntry::from_value).collect()),
                _ => None,
            })
            .unwrap_or_default();
        Some(Self { data_types, fields })
    }

    /// Names of the data types in this block, in table order.
    pub fn data_type_names(&self) -> Vec<&DataTypeName> {
        self.data_types.iter().map(|e| &e.name).collect()
    }
}

/// Association of a property with its allowed data types and blocks,
/// within one template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBinding {
    #[serde(alias = "o:property")]
    pub property: MemberRef,
    #[serde(default, alias = "o:data_type")]
    pub data_types: Vec<DataTypeName>,
    #[serde(default, alias = "o:data")]
    pub data_blocks: Vec<DataBlock>,
    /// Other binding-level keys (alternate label, required flag, ...),
    /// carried through merges untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const BINDING_KEYS: [&str; 3] = [keys::PROPERTY, keys::DATA_TYPE, keys::DATA];

impl PropertyBinding {
    pub fn new(property: MemberRef) -> Self {
        Self {
            property,
            ..Self::default()
        }
    }

    /// Store encoding. `None` when the property has not been resolved.
    pub fn to_value(&self) -> Option<Value> {
        let id = self.property.id?;
        let mut map = self.extra.clone();
        map.insert(keys::PROPERTY.to_string(), RecordRef::new(id).to_value());
        map.insert(
            keys::DATA_TYPE.to_string(),
            Value::Array(self.data_types.iter().map(|d| Value::from(d.as_str())).collect()),
        );
        map.insert(
            keys::DATA.to_string(),
            Value::Array(self.data_blocks.iter().map(DataBlock::to_value).collect()),
        );
        Some(Value::Object(map))
    }

    /// Reads a stored binding; the property carries only its id until the
    /// caller hydrates vocabulary metadata.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let id = map.get(keys::PROPERTY).and_then(normalize_reference)?.id;
        let data_types = match map.get(keys::DATA_TYPE) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(DataTypeName::new)
                .collect(),
            Some(Value::String(single)) => vec![DataTypeName::new(single.as_str())],
            _ => Vec::new(),
        };
        let data_blocks = match map.get(keys::DATA) {
            Some(Value::Array(items)) => items.iter().filter_map(DataBlock::from_value).collect(),
            _ => Vec::new(),
        };
        let extra = map
            .iter()
            .filter(|(k, _)| !BINDING_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Self {
            property: MemberRef::by_id(id),
            data_types,
            data_blocks,
            extra,
        })
    }
}

/// Desired state of one resource template. Identity key is the exact,
/// case-sensitive `label`.
///
/// `properties` order is display order and is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTemplateDefinition {
    #[serde(alias = "o:label")]
    pub label: String,
    #[serde(default, alias = "o:resource_class", skip_serializing_if = "Option::is_none")]
    pub resource_class: Option<MemberRef>,
    #[serde(default, alias = "o:title_property", skip_serializing_if = "Option::is_none")]
    pub title_property: Option<MemberRef>,
    #[serde(
        default,
        alias = "o:description_property",
        skip_serializing_if = "Option::is_none"
    )]
    pub description_property: Option<MemberRef>,
    #[serde(default, alias = "o:resource_template_property")]
    pub properties: Vec<PropertyBinding>,
    /// Any other top-level keys, carried through merges untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const TEMPLATE_KEYS: [&str; 6] = [
    keys::ID,
    keys::LABEL,
    keys::RESOURCE_CLASS,
    keys::TITLE_PROPERTY,
    keys::DESCRIPTION_PROPERTY,
    keys::TEMPLATE_PROPERTIES,
];

impl ResourceTemplateDefinition {
    /// Full store payload. Bindings without a resolved property are omitted.
    pub fn to_payload(&self) -> Value {
        let mut map = self.extra.clone();
        map.remove(keys::ID);
        map.insert(keys::LABEL.to_string(), Value::from(self.label.as_str()));
        for (key, member) in [
            (keys::RESOURCE_CLASS, &self.resource_class),
            (keys::TITLE_PROPERTY, &self.title_property),
            (keys::DESCRIPTION_PROPERTY, &self.description_property),
        ] {
            let value = member
                .as_ref()
                .and_then(|m| m.id)
                .map(|id| RecordRef::new(id).to_value())
                .unwrap_or(Value::Null);
            map.insert(key.to_string(), value);
        }
        map.insert(
            keys::TEMPLATE_PROPERTIES.to_string(),
            Value::Array(self.properties.iter().filter_map(PropertyBinding::to_value).collect()),
        );
        Value::Object(map)
    }

    /// Reads a stored template back into document form (ids only).
    pub fn from_record(record: &Record) -> Self {
        let member = |key: &str| record.ref_field(key).map(|r| MemberRef::by_id(r.id));
        let properties = match record.field(keys::TEMPLATE_PROPERTIES) {
            Some(Value::Array(items)) => items.iter().filter_map(PropertyBinding::from_value).collect(),
            _ => Vec::new(),
        };
        let extra = record
            .data
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(k, _)| !TEMPLATE_KEYS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            label: record.str_field(keys::LABEL).unwrap_or_default().to_string(),
            resource_class: member(keys::RESOURCE_CLASS),
            title_property: member(keys::TITLE_PROPERTY),
            description_property: member(keys::DESCRIPTION_PROPERTY),
            properties,
            extra,
        }
    }
}

impl Definition for ResourceTemplateDefinition {
    const KIND: RecordKind = RecordKind::ResourceTemplate;

    fn identity(&self) -> &str {
        &self.label
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_identity("label", &self.label, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
