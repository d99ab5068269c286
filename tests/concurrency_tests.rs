//! Thread-safety of the analyzer: one shared analyzer, one document per
//! thread.

use persona::PersonAnalyzer;
use std::sync::Arc;
use std::thread;

#[test]
fn analyzer_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PersonAnalyzer>();
}

#[test]
fn shared_analyzer_concurrent_documents() {
    let analyzer = Arc::new(PersonAnalyzer::new().expect("analyzer"));
    let texts = [
        ("President Ivanov A.B. met with Minister Petrov", 2),
        ("Ivanov Ivan Ivanovich arrived", 1),
        ("Maria Petrova arrived", 1),
        ("the weather is fine today", 0),
    ];

    let handles: Vec<_> = texts
        .iter()
        .map(|&(text, want)| {
            let analyzer = Arc::clone(&analyzer);
            thread::spawn(move || {
                let mut doc = analyzer.document(text);
                analyzer.process(&mut doc);
                (text, doc.persons().count(), want)
            })
        })
        .collect();

    for h in handles {
        let (text, got, want) = h.join().expect("thread");
        assert_eq!(got, want, "{text}");
    }
}
