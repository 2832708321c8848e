//! End-to-end: analyze a note, save it with explicit links, analyze again

use std::sync::Arc;

use contextual::analyzer::ContextSynthesizer;
use contextual::embedding::{EmbeddingIndex, HashingBackend};
use contextual::linker::{EntityLinker, LinkMode};
use contextual::{Contact, EntityKind, EntityRef, PatternKind, RegexClassifier, RelationshipKind, Snippet, SqliteStore};

fn classifier() -> Arc<RegexClassifier> {
    Arc::new(RegexClassifier::new().unwrap())
}

#[test]
fn explicit_link_overrides_detected_names() {
    let store = SqliteStore::open_in_memory().unwrap().into_handle();
    let sarah = store.insert_contact(&Contact::new("Sarah Mitchell")).unwrap();

    let synthesizer = ContextSynthesizer::new(store.clone(), classifier());
    let result = synthesizer.analyze("Met with Sarah Mitchell and John Davis").unwrap();

    let people: Vec<(&str, bool)> = result
        .detected_people
        .iter()
        .map(|p| (p.name.as_str(), p.exists))
        .collect();
    assert_eq!(people, vec![("Sarah Mitchell", true), ("John Davis", false)]);

    let linker = EntityLinker::new(store.clone(), classifier());
    let (snippet_id, report) = linker
        .save_snippet(
            &Snippet::new("Met with Sarah Mitchell and John Davis"),
            &LinkMode::Explicit(vec!["Sarah Mitchell".to_string()]),
        )
        .unwrap();

    assert_eq!(report.linked.len(), 1);
    assert_eq!(report.linked[0].contact_id, sarah);

    let edges = store.relationships_for(EntityRef::snippet(snippet_id)).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].to, EntityRef::contact(sarah));
    assert_eq!(edges[0].kind, RelationshipKind::Mentions);

    let contacts = store.all_contacts().unwrap();
    assert_eq!(contacts.len(), 1);
    assert!(contacts.iter().all(|c| c.name != "John Davis"));

    // the saved snippet now shows up, with Sarah one hop away
    let result = synthesizer.analyze("John Davis").unwrap();
    assert_eq!(result.exact_matches.len(), 1);
    assert_eq!(result.exact_matches[0].entity, EntityRef::snippet(snippet_id));
    assert!(result
        .related_items
        .iter()
        .any(|item| item.entity == EntityRef::contact(sarah)));
}

#[test]
fn relinking_is_idempotent() {
    let store = SqliteStore::open_in_memory().unwrap().into_handle();
    let linker = EntityLinker::new(store.clone(), classifier());
    let id = store.insert_snippet(&Snippet::new("Kickoff notes")).unwrap();

    let mode = LinkMode::Explicit(vec!["Jane Doe".to_string()]);
    linker.link_snippet(id, &mode).unwrap();
    linker.link_snippet(id, &mode).unwrap();

    assert_eq!(store.relationships_for(EntityRef::snippet(id)).unwrap().len(), 1);
    assert_eq!(store.all_contacts().unwrap().len(), 1);
}

#[test]
fn empty_explicit_list_never_falls_back_to_auto() {
    let store = SqliteStore::open_in_memory().unwrap().into_handle();
    store.insert_contact(&Contact::new("Sarah Mitchell")).unwrap();
    let linker = EntityLinker::new(store.clone(), classifier());

    let (id, _) = linker
        .save_snippet(&Snippet::new("Met with Sarah Mitchell and John Davis"), &LinkMode::Explicit(vec![]))
        .unwrap();

    assert!(store.relationships_for(EntityRef::snippet(id)).unwrap().is_empty());
    assert_eq!(store.all_contacts().unwrap().len(), 1);
}

#[test]
fn pattern_classification() {
    let synthesizer = ContextSynthesizer::new(SqliteStore::open_in_memory().unwrap().into_handle(), classifier());

    let kind = |text: &str| synthesizer.analyze(text).unwrap().detected_type;
    assert_eq!(kind("JT-346"), Some(PatternKind::TicketId));
    assert_eq!(kind("sarah@x.com"), Some(PatternKind::Email));
    assert_eq!(kind("API"), Some(PatternKind::Acronym));
    assert_eq!(kind("api"), None);
    assert_eq!(kind("UTF-8"), Some(PatternKind::Acronym));
}

#[test]
fn semantic_search_respects_threshold() {
    let store = SqliteStore::open_in_memory().unwrap().into_handle();
    let id = store.insert_snippet(&Snippet::new("JWT Authentication Discussion")).unwrap();
    store.insert_snippet(&Snippet::new("Quarterly budget spreadsheet")).unwrap();

    let index = EmbeddingIndex::new(store.clone(), Arc::new(HashingBackend::default()));
    assert_eq!(index.generate_all().unwrap(), 2);

    let matches = index.find_similar("authentication tokens", 5, 0.3).unwrap();
    assert_eq!(matches[0].entity, EntityRef::snippet(id));
    assert_eq!(matches[0].entity.kind, EntityKind::Snippet);

    let score = matches[0].score;
    let above = index.find_similar("authentication tokens", 5, score + 0.01).unwrap();
    assert!(above.iter().all(|m| m.entity != EntityRef::snippet(id)));
}
