//! Resource template passes: reference resolution and property merge.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use schemasync_model::{keys, CustomVocabDefinition, ResourceTemplateDefinition};
use schemasync_reconcile::{ExistingPolicy, Mode, Outcome, PlannedAction, ReconcileConfig, Warning};
use schemasync_types::{MemberKind, RecordKind};
use serde_json::{json, Value};

fn template(value: Value) -> ResourceTemplateDefinition {
    serde_json::from_value(value).unwrap()
}

fn book(properties: &[&str]) -> ResourceTemplateDefinition {
    let bindings: Vec<Value> = properties
        .iter()
        .map(|term| json!({"property": term, "data_types": ["literal"]}))
        .collect();
    template(json!({
        "label": "Book",
        "resource_class": "dcterms:BibliographicResource",
        "properties": bindings,
    }))
}

fn seeded() -> Harness {
    let h = harness();
    h.seed_dcterms();
    h
}

#[test]
fn creates_template_with_resolved_references() {
    let h = seeded();

    let report = h
        .reconciler
        .reconcile_templates(&[book(&["dcterms:title", "dcterms:creator"])], Mode::CheckAndApply)
        .unwrap();

    let stored = h.find(RecordKind::ResourceTemplate, "Book");
    assert_eq!(report.outcomes(), vec![&Outcome::Created(stored.id)]);
    let class = h.member(MemberKind::Class, DCTERMS, "BibliographicResource").unwrap();
    assert_eq!(stored.data[keys::RESOURCE_CLASS], json!({"o:id": class.id.get()}));
    assert_eq!(
        bound_property_ids(&stored),
        vec![h.property_id("title"), h.property_id("creator")]
    );
}

#[test]
fn resolves_by_namespace_and_by_explicit_id() {
    let h = seeded();
    let date = h.property_id("date");
    let doc = template(json!({
        "label": "Event",
        "properties": [
            {"property": {"vocabulary_namespace_uri": DCTERMS, "local_name": "title"}},
            {"property": date},
        ],
    }));

    h.reconciler.reconcile_templates(&[doc], Mode::CheckAndApply).unwrap();

    let stored = h.find(RecordKind::ResourceTemplate, "Event");
    assert_eq!(bound_property_ids(&stored), vec![h.property_id("title"), date]);
}

#[test]
fn keeps_existing_order_and_appends_new_bindings() {
    let h = seeded();
    h.reconciler
        .reconcile_templates(
            &[book(&["dcterms:title", "dcterms:creator", "dcterms:date"])],
            Mode::CheckAndApply,
        )
        .unwrap();

    let report = h
        .reconciler
        .reconcile_templates(&[book(&["dcterms:creator", "dcterms:subject"])], Mode::CheckAndApply)
        .unwrap();

    let stored = h.find(RecordKind::ResourceTemplate, "Book");
    assert_eq!(report.outcomes(), vec![&Outcome::Updated(stored.id)]);
    assert_eq!(
        bound_property_ids(&stored),
        ["title", "creator", "date", "subject"].map(|p| h.property_id(p)).to_vec()
    );
}

#[test]
fn unions_data_types_and_merges_first_blocks() {
    let h = seeded();
    let first = template(json!({
        "label": "Book",
        "properties": [{
            "property": "dcterms:creator",
            "data_types": ["literal"],
            "data_blocks": [{"data_types": ["literal"], "o:alternate_label": "Author"}],
        }],
    }));
    let second = template(json!({
        "label": "Book",
        "properties": [{
            "property": "dcterms:creator",
            "data_types": ["uri", "literal"],
            "data_blocks": [{"data_types": [{"name": "uri", "label": "Link"}], "o:is_required": true}],
        }],
    }));

    h.reconciler.reconcile_templates(&[first], Mode::CheckAndApply).unwrap();
    h.reconciler.reconcile_templates(&[second], Mode::CheckAndApply).unwrap();

    let stored = h.find(RecordKind::ResourceTemplate, "Book");
    let binding = binding_for(&stored, h.property_id("creator"));
    assert_eq!(binding[keys::DATA_TYPE], json!(["literal", "uri"]));
    assert_eq!(
        binding[keys::DATA],
        json!([{
            "o:alternate_label": "Author",
            "o:is_required": true,
            "o:data_type": [{"name": "literal"}, {"name": "uri", "label": "Link"}],
        }])
    );
}

#[test]
fn reapplying_a_document_changes_nothing() {
    let h = seeded();
    let doc = book(&["dcterms:title", "dcterms:creator"]);
    h.reconciler.reconcile_templates(&[doc.clone()], Mode::CheckAndApply).unwrap();
    let before = h.find(RecordKind::ResourceTemplate, "Book");

    h.reconciler.reconcile_templates(&[doc], Mode::CheckAndApply).unwrap();

    assert_eq!(h.find(RecordKind::ResourceTemplate, "Book").data, before.data);
}

#[test]
fn keeps_stored_keys_the_document_omits() {
    let h = seeded();
    let first = template(json!({"label": "Book", "o:is_public": false, "properties": []}));
    h.reconciler.reconcile_templates(&[first], Mode::CheckAndApply).unwrap();

    h.reconciler
        .reconcile_templates(&[book(&["dcterms:title"])], Mode::CheckAndApply)
        .unwrap();

    let stored = h.find(RecordKind::ResourceTemplate, "Book");
    assert_eq!(stored.data["o:is_public"], json!(false));
    assert_eq!(bound_property_ids(&stored), vec![h.property_id("title")]);
}

#[test]
fn keeps_binding_level_keys_the_document_omits() {
    let h = seeded();
    let first = template(json!({
        "label": "Book",
        "properties": [{
            "property": "dcterms:title",
            "data_types": ["literal"],
            "o:alternate_label": "Name",
            "o:is_required": true,
        }],
    }));
    let second = template(json!({
        "label": "Book",
        "properties": [{"property": "dcterms:title", "data_types": ["uri"]}],
    }));

    h.reconciler.reconcile_templates(&[first], Mode::CheckAndApply).unwrap();
    h.reconciler.reconcile_templates(&[second], Mode::CheckAndApply).unwrap();

    let stored = h.find(RecordKind::ResourceTemplate, "Book");
    let binding = binding_for(&stored, h.property_id("title"));
    assert_eq!(binding["o:alternate_label"], json!("Name"));
    assert_eq!(binding["o:is_required"], json!(true));
    assert_eq!(binding[keys::DATA_TYPE], json!(["literal", "uri"]));
}

#[test]
fn drops_unresolved_references_with_warnings() {
    let h = seeded();
    let doc = template(json!({
        "label": "Book",
        "resource_class": "bibo:Book",
        "properties": [
            {"property": "dcterms:title"},
            {"property": "dcterms:nonexistent"},
        ],
    }));

    let report = h.reconciler.reconcile_templates(&[doc], Mode::CheckAndApply).unwrap();

    let document = &report.documents[0];
    assert!(matches!(document.outcome, Outcome::Created(_)));
    let unresolved: Vec<&str> = document
        .warnings
        .iter()
        .map(|w| match w {
            Warning::UnresolvedReference { reference, .. } => reference.as_str(),
            other => panic!("unexpected warning {other:?}"),
        })
        .collect();
    assert_eq!(unresolved, vec!["bibo:Book", "dcterms:nonexistent"]);
    let stored = h.find(RecordKind::ResourceTemplate, "Book");
    assert_eq!(stored.data[keys::RESOURCE_CLASS], Value::Null);
    assert_eq!(bound_property_ids(&stored), vec![h.property_id("title")]);
}

#[test]
fn resolves_custom_vocab_data_types_by_label() {
    let h = seeded();
    let colors: CustomVocabDefinition =
        serde_json::from_value(json!({"label": "Colors", "terms": ["red"]})).unwrap();
    h.reconciler.reconcile_custom_vocabs(&[colors], Mode::CheckAndApply).unwrap();
    let colors_id = h.find(RecordKind::CustomVocab, "Colors").id;
    let doc = template(json!({
        "label": "Paint",
        "properties": [{
            "property": "dcterms:subject",
            "data_types": ["customvocab:Colors", "customvocab:Sizes", "literal"],
        }],
    }));

    let report = h.reconciler.reconcile_templates(&[doc], Mode::CheckAndApply).unwrap();

    let stored = h.find(RecordKind::ResourceTemplate, "Paint");
    let binding = binding_for(&stored, h.property_id("subject"));
    assert_eq!(binding[keys::DATA_TYPE], json!([format!("customvocab:{colors_id}"), "literal"]));
    assert_eq!(report.documents[0].warnings.len(), 1);
}

#[test]
fn invalid_template_fails_alone() {
    let h = seeded();
    let docs = [template(json!({"label": "  "})), book(&["dcterms:title"])];

    let report = h.reconciler.reconcile_templates(&docs, Mode::CheckAndApply).unwrap();

    assert!(report.documents[0].outcome.is_failed());
    assert!(!report.documents[0].applied);
    assert!(matches!(report.documents[1].outcome, Outcome::Created(_)));
}

#[test]
fn padded_label_fails_without_touching_the_exact_match() {
    let h = seeded();
    h.reconciler
        .reconcile_templates(&[book(&["dcterms:title"])], Mode::CheckAndApply)
        .unwrap();
    let before = h.find(RecordKind::ResourceTemplate, "Book");
    let padded = template(json!({
        "label": "Book ",
        "properties": [{"property": "dcterms:subject"}],
    }));

    let report = h.reconciler.reconcile_templates(&[padded], Mode::CheckAndApply).unwrap();

    assert!(report.documents[0].outcome.is_failed());
    assert_eq!(h.find(RecordKind::ResourceTemplate, "Book"), before);
    assert_eq!(h.count(RecordKind::ResourceTemplate), 1);
}

#[test]
fn check_only_plans_update_for_existing_template() {
    let h = seeded();
    h.reconciler
        .reconcile_templates(&[book(&["dcterms:title"])], Mode::CheckAndApply)
        .unwrap();
    let before = h.find(RecordKind::ResourceTemplate, "Book");

    let report = h
        .reconciler
        .reconcile_templates(&[book(&["dcterms:subject"])], Mode::CheckOnly)
        .unwrap();

    assert_eq!(report.outcomes(), vec![&Outcome::Planned(PlannedAction::Update(before.id))]);
    assert_eq!(h.find(RecordKind::ResourceTemplate, "Book"), before);
}

#[test]
fn skip_policy_reports_existing_template() {
    let h = harness_with(ReconcileConfig {
        on_existing_template: ExistingPolicy::Skip,
        ..ReconcileConfig::default()
    });
    h.seed_dcterms();
    h.reconciler
        .reconcile_templates(&[book(&["dcterms:title"])], Mode::CheckAndApply)
        .unwrap();
    let before = h.find(RecordKind::ResourceTemplate, "Book");

    let report = h
        .reconciler
        .reconcile_templates(&[book(&["dcterms:subject"])], Mode::CheckAndApply)
        .unwrap();

    assert_eq!(report.outcomes(), vec![&Outcome::SkippedExisting(before.id)]);
    assert_eq!(h.find(RecordKind::ResourceTemplate, "Book"), before);
}
