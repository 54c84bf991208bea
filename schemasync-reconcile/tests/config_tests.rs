//! Reconciler configuration defaults and deserialization.

use pretty_assertions::assert_eq;
use schemasync_model::encoding::PayloadEncoding;
use schemasync_reconcile::{ExistingPolicy, ReconcileConfig};
use serde_json::json;

#[test]
fn defaults_update_everything_and_rewrite_references() {
    let config = ReconcileConfig::default();
    assert_eq!(config.on_existing_vocabulary, ExistingPolicy::Update);
    assert_eq!(config.on_existing_template, ExistingPolicy::Update);
    assert_eq!(config.on_existing_custom_vocab, ExistingPolicy::Update);
    assert_eq!(config.custom_vocab_encoding, PayloadEncoding::Structured);
    assert!(config.import.is_empty());
    assert!(config.rewrite_references);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let config: ReconcileConfig = serde_json::from_value(json!({
        "on_existing_template": "skip",
        "custom_vocab_encoding": "delimited",
        "import": {"format": "turtle"},
    }))
    .unwrap();

    assert_eq!(config.on_existing_template, ExistingPolicy::Skip);
    assert_eq!(config.on_existing_vocabulary, ExistingPolicy::Update);
    assert_eq!(config.custom_vocab_encoding, PayloadEncoding::Delimited);
    assert_eq!(config.import.format.as_deref(), Some("turtle"));
    assert!(config.rewrite_references);
}

#[test]
fn rejects_unknown_policy() {
    let result = serde_json::from_value::<ReconcileConfig>(json!({"on_existing_vocabulary": "replace"}));
    assert!(result.is_err());
}
