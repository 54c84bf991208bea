//! Store-agnostic fixtures and behaviour checks shared by the store tests.

#![allow(dead_code)]

use pretty_assertions::assert_eq;
use schemasync_model::{keys, Record};
use schemasync_storage::{Filter, Statement, Store, StoreError};
use schemasync_types::{MemberKind, RecordId, RecordKind};
use serde_json::{json, Value};

pub fn vocabulary(store: &dyn Store, ns: &str, prefix: &str) -> Record {
    store
        .create(
            RecordKind::Vocabulary,
            json!({"o:namespace_uri": ns, "o:prefix": prefix, "o:label": prefix}),
        )
        .unwrap()
}

pub fn member(store: &dyn Store, kind: MemberKind, vocabulary: &Record, local: &str) -> Record {
    store
        .create(
            kind.record_kind(),
            json!({"o:local_name": local, "o:label": local, "o:vocabulary": {"o:id": vocabulary.id.get()}}),
        )
        .unwrap()
}

pub fn id_of(value: &Value) -> u64 {
    value[keys::ID].as_u64().unwrap()
}

pub fn check_crud(store: &dyn Store) {
    let vocab = vocabulary(store, "http://purl.org/dc/terms/", "dcterms");
    assert_eq!(vocab.data[keys::ID], json!(vocab.id.get()));

    let read = store.read(RecordKind::Vocabulary, vocab.id).unwrap();
    assert_eq!(read, vocab);

    let partial = store
        .update(RecordKind::Vocabulary, vocab.id, json!({"o:comment": "DC"}), true)
        .unwrap();
    assert_eq!(partial.data[keys::PREFIX], json!("dcterms"));
    assert_eq!(partial.data[keys::COMMENT], json!("DC"));

    let full = store
        .update(
            RecordKind::Vocabulary,
            vocab.id,
            json!({"o:namespace_uri": "http://purl.org/dc/terms/", "o:prefix": "dcterms", "o:label": "Dublin Core"}),
            false,
        )
        .unwrap();
    assert!(full.data.get(keys::COMMENT).is_none());
    assert_eq!(full.data[keys::ID], json!(vocab.id.get()));

    store.delete(RecordKind::Vocabulary, vocab.id).unwrap();
    assert!(matches!(
        store.read(RecordKind::Vocabulary, vocab.id),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete(RecordKind::Vocabulary, vocab.id),
        Err(StoreError::NotFound { .. })
    ));
}

pub fn check_ids_not_reused(store: &dyn Store) {
    let first = store.create(RecordKind::Item, json!({})).unwrap();
    store.delete(RecordKind::Item, first.id).unwrap();
    let second = store.create(RecordKind::Item, json!({"o:id": first.id.get()})).unwrap();
    assert!(second.id > first.id);
}

pub fn check_validation(store: &dyn Store) {
    vocabulary(store, "http://xmlns.com/foaf/0.1/", "foaf");
    let dup_prefix = store.create(
        RecordKind::Vocabulary,
        json!({"o:namespace_uri": "http://example.org/foaf/", "o:prefix": "foaf", "o:label": "x"}),
    );
    let errors = dup_prefix.unwrap_err();
    assert!(errors.validation_errors().unwrap()[0].contains("prefix foaf"));

    let missing = store.create(RecordKind::ResourceTemplate, json!({"o:label": "  "}));
    assert!(matches!(missing, Err(StoreError::ValidationFailed { .. })));

    let not_object = store.create(RecordKind::CustomVocab, json!(["x"]));
    assert!(matches!(not_object, Err(StoreError::ValidationFailed { .. })));

    // Uniqueness uses the same exact comparison as lookups.
    store.create(RecordKind::ResourceTemplate, json!({"o:label": "Book"})).unwrap();
    store.create(RecordKind::ResourceTemplate, json!({"o:label": "Book "})).unwrap();
    let books = store
        .search(RecordKind::ResourceTemplate, &Filter::all().eq(keys::LABEL, "Book"))
        .unwrap();
    assert_eq!(books.len(), 1);
}

pub fn check_member_uniqueness(store: &dyn Store) {
    let a = vocabulary(store, "http://a/", "a");
    let b = vocabulary(store, "http://b/", "b");
    member(store, MemberKind::Property, &a, "name");
    member(store, MemberKind::Property, &b, "name");
    member(store, MemberKind::Class, &a, "name");
    let clash = store.create(
        RecordKind::Property,
        json!({"o:local_name": "name", "o:vocabulary": {"o:id": a.id.get()}}),
    );
    assert!(matches!(clash, Err(StoreError::ValidationFailed { .. })));
}

pub fn check_search(store: &dyn Store) {
    let vocab = vocabulary(store, "http://schema.org/", "schema");
    let name = member(store, MemberKind::Property, &vocab, "name");
    member(store, MemberKind::Property, &vocab, "email");

    let by_vocab = store
        .search(RecordKind::Property, &Filter::all().eq(keys::VOCABULARY, vocab.id.get()))
        .unwrap();
    assert_eq!(by_vocab.len(), 2);
    assert!(by_vocab[0].id < by_vocab[1].id);

    let one = store
        .search_one(
            RecordKind::Property,
            &Filter::all()
                .eq(keys::VOCABULARY, json!({"@id": format!("https://host/api/vocabularies/{}", vocab.id)}))
                .eq(keys::LOCAL_NAME, "name"),
        )
        .unwrap();
    assert_eq!(one.found().map(|r| r.id), Some(name.id));

    let none = store
        .search_one(RecordKind::Property, &Filter::all().eq(keys::LOCAL_NAME, "Name"))
        .unwrap();
    assert!(!none.is_found());
}

/// Seeds two properties, a template binding both in different ways and an
/// item using the old one, then replaces `old` with `new`.
pub fn check_rewrite(store: &dyn Store) {
    let vocab = vocabulary(store, "http://example.org/ns#", "ex");
    let old = member(store, MemberKind::Property, &vocab, "foo");
    let new = member(store, MemberKind::Property, &vocab, "bar");

    let item = store
        .create(
            RecordKind::Item,
            json!({"o:values": [
                {"o:property": {"o:id": old.id.get()}, "@value": "x"},
                {"o:property": {"o:id": old.id.get()}, "@value": "y"}
            ]}),
        )
        .unwrap();
    let redirected = store
        .create(
            RecordKind::ResourceTemplate,
            json!({
                "o:label": "Redirected",
                "o:title_property": {"o:id": old.id.get()},
                "o:resource_template_property": [{"o:property": {"o:id": old.id.get()}, "o:data_type": []}]
            }),
        )
        .unwrap();
    let collapsed = store
        .create(
            RecordKind::ResourceTemplate,
            json!({
                "o:label": "Collapsed",
                "o:resource_template_property": [
                    {"o:property": {"o:id": new.id.get()}},
                    {"o:property": {"o:id": old.id.get()}}
                ]
            }),
        )
        .unwrap();

    let counts = store
        .execute_batch(&[
            Statement::RedirectRecordUsages { kind: MemberKind::Property, from: old.id, to: new.id },
            Statement::RedirectTemplateUsages { kind: MemberKind::Property, from: old.id, to: new.id },
            Statement::DeleteRecord { kind: RecordKind::Property, id: old.id },
        ])
        .unwrap();
    assert_eq!(counts, vec![2, 3, 1]);

    let item = store.read(RecordKind::Item, item.id).unwrap();
    assert_eq!(id_of(&item.data["o:values"][0]["o:property"]), new.id.get());
    assert_eq!(id_of(&item.data["o:values"][1]["o:property"]), new.id.get());

    let redirected = store.read(RecordKind::ResourceTemplate, redirected.id).unwrap();
    assert_eq!(id_of(&redirected.data[keys::TITLE_PROPERTY]), new.id.get());
    assert_eq!(
        id_of(&redirected.data[keys::TEMPLATE_PROPERTIES][0][keys::PROPERTY]),
        new.id.get()
    );

    let collapsed = store.read(RecordKind::ResourceTemplate, collapsed.id).unwrap();
    let bindings = collapsed.data[keys::TEMPLATE_PROPERTIES].as_array().unwrap();
    assert_eq!(bindings.len(), 1);
    assert_eq!(id_of(&bindings[0][keys::PROPERTY]), new.id.get());

    assert!(store.read(RecordKind::Property, old.id).is_err());
}

/// A failing statement leaves the earlier statements of the batch undone.
pub fn check_batch_atomicity(store: &dyn Store) {
    let vocab = vocabulary(store, "http://example.org/", "ex");
    let old = member(store, MemberKind::Class, &vocab, "Old");
    let new = member(store, MemberKind::Class, &vocab, "New");
    let item = store
        .create(RecordKind::Item, json!({"o:resource_class": {"o:id": old.id.get()}}))
        .unwrap();
    let missing = RecordId::new(9_999).unwrap();

    let result = store.execute_batch(&[
        Statement::RedirectRecordUsages { kind: MemberKind::Class, from: old.id, to: new.id },
        Statement::DeleteRecord { kind: RecordKind::ResourceClass, id: missing },
    ]);
    assert!(matches!(result, Err(StoreError::NotFound { .. })));

    let item = store.read(RecordKind::Item, item.id).unwrap();
    assert_eq!(id_of(&item.data[keys::RESOURCE_CLASS]), old.id.get());
}

pub fn check_zero_usages(store: &dyn Store) {
    let vocab = vocabulary(store, "http://example.org/", "ex");
    let old = member(store, MemberKind::Class, &vocab, "Unused");
    let new = member(store, MemberKind::Class, &vocab, "Used");
    let counts = store
        .execute_batch(&[
            Statement::RedirectRecordUsages { kind: MemberKind::Class, from: old.id, to: new.id },
            Statement::RedirectTemplateUsages { kind: MemberKind::Class, from: old.id, to: new.id },
            Statement::DeleteRecord { kind: RecordKind::ResourceClass, id: old.id },
        ])
        .unwrap();
    assert_eq!(counts, vec![0, 0, 1]);
}
