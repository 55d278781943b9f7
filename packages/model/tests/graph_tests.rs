//! Loading, querying and bracketing through the public API

use std::cell::RefCell;
use std::rc::Rc;

use scenekit_model::{
    walk_document, Alias, AliasKind, Document, DocumentSpec, Location, ModelError, NodeSpec,
    OrderCollector,
};

const FORM: &str = r#"{
    "root": {
        "type": "instance",
        "class": "GridPane",
        "fxId": "form",
        "controller": "app.FormController",
        "properties": [
            { "name": "children", "values": [
                { "type": "instance", "class": "Label", "properties": [
                    { "name": "text", "value": "Name" },
                    { "name": "labelFor", "value": "$name" }
                ] },
                { "type": "instance", "class": "TextField", "fxId": "name" },
                { "type": "collection", "items": [
                    { "type": "reference", "source": "name" },
                    { "type": "copy", "source": "form" }
                ] }
            ] }
        ]
    }
}"#;

#[test]
fn test_json_round_trip_keeps_structure() -> anyhow::Result<()> {
    let doc = Document::from_json(FORM)?;
    let reloaded = Document::from_json(&doc.to_json()?)?;
    assert_eq!(doc.to_spec(), reloaded.to_spec());

    let root = reloaded.root().unwrap();
    assert_eq!(reloaded.object(root).controller(), Some("app.FormController"));
    assert_eq!(reloaded.children_of(root).len(), 3);
    Ok(())
}

#[test]
fn test_load_rejects_duplicate_ids() {
    let spec = DocumentSpec {
        root: Some(NodeSpec::instance("VBox").with_values(
            "children",
            vec![
                NodeSpec::instance("Label").with_fx_id("twice"),
                NodeSpec::instance("Label").with_fx_id("twice"),
            ],
        )),
    };
    match Document::from_spec(&spec) {
        Err(ModelError::DuplicateFxId(id)) => assert_eq!(id, "twice"),
        other => panic!("expected a duplicate id error, got {:?}", other.map(|_| ())),
    }
    assert!(matches!(Document::from_json("{ \"root\": 4 }"), Err(ModelError::Json(_))));
}

#[test]
fn test_aliases_in_document_order() -> anyhow::Result<()> {
    let doc = Document::from_json(FORM)?;
    let aliases = doc.collect_aliases(None);

    let kinds: Vec<AliasKind> = aliases.iter().map(|alias| alias.kind(&doc)).collect();
    assert_eq!(kinds, vec![AliasKind::Expression, AliasKind::Reference, AliasKind::Copy]);
    let sources: Vec<&str> = aliases.iter().map(|alias| alias.source(&doc)).collect();
    assert_eq!(sources, vec!["name", "name", "form"]);

    // the intrinsics sit in an anonymous collection inside `children`
    assert_eq!(aliases[1].property_name(&doc), Some("children"));
    assert!(matches!(aliases[0], Alias::Expression(_)));
    assert_eq!(doc.collect_aliases(Some("form")).len(), 1);
    Ok(())
}

#[test]
fn test_walk_matches_document_order() -> anyhow::Result<()> {
    let doc = Document::from_json(FORM)?;
    let mut collector = OrderCollector::default();
    walk_document(&mut collector, &doc);
    assert_eq!(collector.objects, doc.document_order());
    assert_eq!(collector.objects.len(), 6);
    Ok(())
}

#[test]
fn test_detach_and_attach_restore_location() -> anyhow::Result<()> {
    let mut doc = Document::from_json(FORM)?;
    let field = doc.search_with_fx_id("name").unwrap();
    let before = doc.snapshot();

    let location = doc.update(|doc| doc.detach(field));
    assert!(matches!(location, Location::Property { index: 1, .. }));
    assert!(!doc.is_attached(field));
    assert!(!doc.is_declared("name"));

    doc.update(|doc| doc.attach(field, location));
    assert_eq!(doc.snapshot(), before);
    assert_eq!(doc.revision(), 2);
    Ok(())
}

#[test]
fn test_nested_brackets_notify_once() -> anyhow::Result<()> {
    let mut doc = Document::from_json(FORM)?;
    let field = doc.search_with_fx_id("name").unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    doc.subscribe(move |revision| sink.borrow_mut().push(revision));

    doc.begin_update();
    doc.update(|doc| doc.set_fx_id(field, Some("email".into())));
    doc.update(|doc| doc.set_controller(field, Some("x.Y".into())));
    assert!(seen.borrow().is_empty());
    doc.end_update();

    assert_eq!(*seen.borrow(), vec![1]);
    assert!(doc.is_declared("email"));

    // an empty bracket changes nothing
    doc.update(|_| {});
    assert_eq!(doc.revision(), 1);
    Ok(())
}

#[test]
#[should_panic(expected = "outside begin_update")]
fn test_attached_edit_needs_bracket() {
    let mut doc = Document::from_json(FORM).unwrap();
    let field = doc.search_with_fx_id("name").unwrap();
    doc.set_fx_id(field, Some("email".into()));
}
