//! End-to-end scenarios: plain text in, persons and their properties out.

use persona::services::{KnownPerson, PersonGazetteer, PhraseResolver};
use persona::{
    slots, AnalyzerConfig, Document, PersonAnalyzer, ProcessOutcome, Referent, ReferentGraph,
    SurnamePolicy,
};
use std::sync::Arc;

fn analyzer() -> PersonAnalyzer {
    PersonAnalyzer::new().expect("analyzer")
}

fn run(text: &str) -> Document {
    let a = analyzer();
    let mut doc = a.document(text);
    assert_eq!(a.process(&mut doc), ProcessOutcome::Completed);
    doc
}

fn attr_names(doc: &Document, person: &persona::PersonReferent) -> Vec<String> {
    person
        .attributes()
        .filter_map(|id| doc.registry().property(id))
        .filter_map(|p| p.name().map(str::to_string))
        .collect()
}

// =============================================================================
// Mentions
// =============================================================================

#[test]
fn president_and_minister() {
    let doc = run("President Ivanov A.B. met with Minister Petrov");
    let persons: Vec<_> = doc.persons().map(|(_, p)| p.clone()).collect();
    assert_eq!(persons.len(), 2);

    let ivanov = &persons[0];
    assert_eq!(ivanov.lastnames().collect::<Vec<_>>(), vec!["IVANOV"]);
    assert_eq!(ivanov.firstnames().collect::<Vec<_>>(), vec!["A"]);
    assert_eq!(ivanov.middlenames().collect::<Vec<_>>(), vec!["B"]);
    assert_eq!(attr_names(&doc, ivanov), vec!["president"]);

    let petrov = &persons[1];
    assert_eq!(petrov.lastnames().collect::<Vec<_>>(), vec!["PETROV"]);
    assert_eq!(attr_names(&doc, petrov), vec!["minister"]);
}

#[test]
fn full_name_round_trip() {
    let doc = run("Ivanov Ivan Ivanovich");
    let (_, p) = doc.persons().next().expect("person");
    assert_eq!(p.lastnames().collect::<Vec<_>>(), vec!["IVANOV"]);
    assert_eq!(p.firstnames().collect::<Vec<_>>(), vec!["IVAN"]);
    assert_eq!(p.middlenames().collect::<Vec<_>>(), vec!["IVANOVICH"]);
    assert!(p.is_male());
    assert_eq!(p.to_string(), "IVANOV IVAN IVANOVICH");
}

#[test]
fn repeated_mentions_merge() {
    let doc = run("Ivanov Ivan Ivanovich arrived. Ivanov I.I. said hello.");
    assert_eq!(doc.persons().count(), 1);
    let (id, p) = doc.persons().next().expect("person");
    assert_eq!(p.firstnames().collect::<Vec<_>>(), vec!["IVAN"]);
    assert_eq!(doc.registry().occurrences(id).len(), 2);
}

#[test]
fn gender_follows_first_name() {
    let doc = run("Maria Petrova arrived");
    let (_, p) = doc.persons().next().expect("person");
    assert!(p.is_female());
    assert_eq!(p.lastnames().collect::<Vec<_>>(), vec!["PETROVA"]);
}

#[test]
fn tied_readings_are_rejected() {
    let doc = run("Morgan Thomas said hello");
    assert_eq!(doc.persons().count(), 0);
}

#[test]
fn shared_surname_stays_ambiguous() {
    let doc = run("Ivan Ivanov and Petr Ivanov met. Ivanov said hello.");
    assert_eq!(doc.persons().count(), 2);
}

#[test]
fn royal_ordinals_keep_kings_apart() {
    let doc = run("King Louis XIV met King Louis XIII");
    let nicknames: Vec<_> = doc
        .persons()
        .filter_map(|(_, p)| p.nickname().map(str::to_string))
        .collect();
    assert_eq!(nicknames, vec!["XIV", "XIII"]);

    let doc = run("King Louis XIV arrived. King Louis XIV left.");
    assert_eq!(doc.persons().count(), 1);
}

#[test]
fn ordinal_nickname_in_running_text() {
    let doc = run("Peter I arrived");
    let (_, p) = doc.persons().next().expect("person");
    assert_eq!(p.nickname(), Some("I"));
    assert_eq!(p.firstnames().collect::<Vec<_>>(), vec!["PETER"]);
}

#[test]
fn ordinal_surname_and_nickname_merge() {
    let doc = run("Петр Первый и Петр I");
    assert_eq!(doc.persons().count(), 1);
    let (id, _) = doc.persons().next().expect("person");
    assert_eq!(doc.registry().occurrences(id).len(), 2);
}

#[test]
fn sibling_list_shares_surname_and_attributes() {
    let doc = run("Minister Ivan Petrov and Maria were there");
    let persons: Vec<_> = doc.persons().map(|(_, p)| p.clone()).collect();
    assert_eq!(persons.len(), 2);
    assert!(persons[1].is_female());
    assert!(persons[1].lastnames().any(|s| s == "PETROVA"));
    assert_eq!(attr_names(&doc, &persons[1]), vec!["minister"]);
}

#[test]
fn organization_reference_on_position() {
    let a = PersonAnalyzer::builder()
        .foreign_resolver(Arc::new(PhraseResolver::new("ORGANIZATION", &["Gazprom"])))
        .build()
        .expect("analyzer");
    let mut doc = a.document("director of Gazprom Alexey Miller said");
    a.process(&mut doc);
    let (_, p) = doc.persons().next().expect("person");
    let prop_id = p.attributes().next().expect("attr");
    let prop = doc.registry().property(prop_id).expect("property");
    let org = prop.refs().next().expect("ref");
    assert!(matches!(doc.registry().get(org), Some(Referent::Foreign(f)) if f.type_name == "ORGANIZATION"));
    assert!(!doc.registry().occurrences(org).is_empty());
}

// =============================================================================
// Identity documents
// =============================================================================

#[test]
fn passport_attaches_to_holder() {
    let doc = run("Sidorov Petr Ivanovich: passport series 4510 number 123456 issued 12.05.2010");
    let (_, p) = doc.persons().next().expect("person");
    let iddoc = p.slots.first_ref(slots::IDDOC).expect("iddoc");
    let id = doc
        .registry()
        .get(iddoc)
        .and_then(Referent::as_identity)
        .expect("identity");
    assert_eq!(id.number(), Some("4510 123456"));
    assert_eq!(id.slots.first_text(slots::DATE), Some("12.05.2010"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn surname_policy_controls_collapsed_forms() {
    for (policy, want) in [
        (SurnamePolicy::PreferShortest, "IVANOV"),
        (SurnamePolicy::PreferLongest, "IVANOVA"),
    ] {
        let a = PersonAnalyzer::builder()
            .config(AnalyzerConfig::default().with_surname_policy(policy))
            .build()
            .expect("analyzer");
        let mut doc = a.document("Ivanov; Ivanova");
        let t = doc.tokens().first().expect("token");
        let (id, _) = a
            .resolve_from_known_entries(&mut doc, t, &PersonGazetteer::default())
            .expect("entry");
        assert_eq!(doc.persons().count(), 1);
        let p = doc
            .registry()
            .get(id)
            .and_then(Referent::as_person)
            .expect("person");
        assert_eq!(p.lastnames().collect::<Vec<_>>(), vec![want]);
    }
}

#[test]
fn known_entries_fold_variants() {
    let a = analyzer();
    let gazetteer = PersonGazetteer::new(vec![KnownPerson::new("Sidorov", "Petr")]);
    let mut doc = a.document("Ivanov Ivan Ivanovich; Ivanov I.I.");
    let t = doc.tokens().first().expect("token");
    let (id, end) = a
        .resolve_from_known_entries(&mut doc, t, &gazetteer)
        .expect("entry");
    let semicolon = doc.text().find(';').expect("separator");
    assert!(doc.tokens().token(end).begin_char > semicolon);
    assert_eq!(doc.persons().count(), 1);
    let p = doc
        .registry()
        .get(id)
        .and_then(Referent::as_person)
        .expect("person");
    assert_eq!(p.firstnames().collect::<Vec<_>>(), vec!["IVAN"]);
}

// =============================================================================
// Progress and registry
// =============================================================================

#[test]
fn cancelling_stops_the_scan() {
    let a = PersonAnalyzer::builder()
        .config(AnalyzerConfig::default().with_progress_quantum(10))
        .build()
        .expect("analyzer");
    let mut doc = a.document("Minister Petrov arrived. President Ivanov A.B. left the meeting today.");
    let mut calls = 0;
    let outcome = a.process_with_progress(&mut doc, |_| {
        calls += 1;
        calls < 2
    });
    assert_eq!(outcome, ProcessOutcome::Cancelled);
    assert_eq!(calls, 2);
}

#[test]
fn empty_first_pass_skips_the_second() {
    let a = analyzer();
    let mut doc = a.document("the weather is fine today");
    let mut steps = Vec::new();
    let outcome = a.process_with_progress(&mut doc, |p| {
        steps.push(p.step);
        true
    });
    assert_eq!(outcome, ProcessOutcome::Completed);
    assert!(!steps.is_empty());
    assert!(steps.iter().all(|&s| s == 0));

    let mut doc = a.document("Minister Petrov arrived");
    let mut steps = Vec::new();
    a.process_with_progress(&mut doc, |p| {
        steps.push(p.step);
        true
    });
    assert!(steps.contains(&1));
}

#[test]
fn merged_ids_stay_resolvable() {
    let mut doc = run("Ivan Ivanov arrived. Petr Petrov left.");
    let ids: Vec<_> = doc.persons().map(|(id, _)| id).collect();
    assert_eq!(ids.len(), 2);
    assert!(doc.registry_mut().merge_into(ids[1], ids[0]));
    assert_eq!(doc.registry().resolve(ids[1]), ids[0]);
    assert_eq!(doc.registry().aliases().get(&ids[1]), Some(&ids[0]));
    assert_eq!(doc.persons().count(), 1);
    assert_eq!(doc.registry().occurrences(ids[0]).len(), 2);
    let index = doc.span_index();
    assert!(index.values().flatten().all(|&id| id != ids[1]));
}
