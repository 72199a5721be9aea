//! Integration tests for the indexed entity stores
//!
//! Exercises index consistency across full add/update/delete sequences and
//! under concurrent mutation from multiple threads.

use gradestore::config::CoreConfig;
use gradestore::store::{grade_store, student_store, IndexDescriptor, IndexedStore};
use gradestore::types::{Grade, Student, StudentKind};
use std::collections::HashSet;
use std::sync::Arc;

fn student(id: &str, name: &str, email: &str, kind: StudentKind) -> Student {
    Student::new(id, name, email, kind)
}

#[test]
fn test_type_index_tracks_membership() {
    let store = student_store();
    store
        .insert(student("S1", "Ada", "ada@example.edu", StudentKind::Honors))
        .unwrap();
    store
        .insert(student("S2", "Bob", "bob@example.edu", StudentKind::Honors))
        .unwrap();
    store
        .insert(student("S3", "Cat", "cat@example.edu", StudentKind::Regular))
        .unwrap();

    let honors = store.find_by_index("kind", "Honors");
    assert_eq!(honors.len(), 2);

    assert!(store.remove("S1"));
    let honors = store.find_by_index("kind", "Honors");
    assert_eq!(honors.len(), 1);
    assert_eq!(honors[0].id, "S2");
}

#[test]
fn test_index_consistency_after_mixed_operations() {
    let store = student_store();

    for i in 0..50 {
        let kind = if i % 2 == 0 {
            StudentKind::Regular
        } else {
            StudentKind::Honors
        };
        store
            .insert(student(
                &format!("S{:02}", i),
                &format!("Student {}", i),
                &format!("s{}@example.edu", i),
                kind,
            ))
            .unwrap();
    }

    // Flip half the regulars to honors, delete every fifth student
    for i in (0..50).step_by(4) {
        let mut s = store.get(&format!("S{:02}", i)).unwrap();
        s.kind = StudentKind::Honors;
        assert!(store.update(&format!("S{:02}", i), s));
    }
    for i in (0..50).step_by(5) {
        store.remove(&format!("S{:02}", i));
    }

    // Every index bucket must equal the set derivable from the primary map
    let all = store.all();
    for kind in ["Regular", "Honors"] {
        let from_index: HashSet<String> = store
            .find_by_index("kind", kind)
            .into_iter()
            .map(|s| s.id)
            .collect();
        let from_primary: HashSet<String> = all
            .iter()
            .filter(|s| s.kind.as_str() == kind)
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(from_index, from_primary, "kind index diverged for {}", kind);
    }

    let domains: HashSet<String> = all.iter().filter_map(|s| s.email_domain()).collect();
    for domain in domains {
        let from_index: HashSet<String> = store
            .find_by_index("email_domain", &domain)
            .into_iter()
            .map(|s| s.id)
            .collect();
        let from_primary: HashSet<String> = all
            .iter()
            .filter(|s| s.email_domain().as_deref() == Some(domain.as_str()))
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(from_index, from_primary, "email index diverged for {}", domain);
    }
}

#[test]
fn test_concurrent_writers_preserve_consistency() {
    let store = Arc::new(student_store());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..100 {
                    let id = format!("T{}-{:03}", t, i);
                    store
                        .insert(student(
                            &id,
                            "Worker Student",
                            &format!("{}@example.edu", id),
                            StudentKind::Regular,
                        ))
                        .unwrap();
                    if i % 3 == 0 {
                        let mut s = store.get(&id).unwrap();
                        s.kind = StudentKind::Honors;
                        store.update(&id, s);
                    }
                    if i % 7 == 0 {
                        store.remove(&id);
                    }
                }
            })
        })
        .collect();

    // Readers run concurrently; they must never see an entity in an index
    // bucket that disagrees with its attribute
    let readers: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    for s in store.find_by_index("kind", "Honors") {
                        assert_eq!(s.kind, StudentKind::Honors);
                    }
                }
            })
        })
        .collect();

    for h in writers.into_iter().chain(readers) {
        h.join().unwrap();
    }

    let from_index: HashSet<String> = store
        .find_by_index("kind", "Honors")
        .into_iter()
        .map(|s| s.id)
        .chain(
            store
                .find_by_index("kind", "Regular")
                .into_iter()
                .map(|s| s.id),
        )
        .collect();
    let from_primary: HashSet<String> = store.keys().into_iter().collect();
    assert_eq!(from_index, from_primary);
}

#[test]
fn test_grade_store_range_and_search() {
    let store = grade_store();
    let rows = [
        ("G1", "S1", "Math", "2026-01-15", "2026-Spring"),
        ("G2", "S1", "Physics", "2026-02-10", "2026-Spring"),
        ("G3", "S2", "Math", "2026-02-20", "2026-Spring"),
        ("G4", "S2", "Math", "2026-09-01", "2026-Fall"),
    ];
    for (id, sid, subject, date, semester) in rows {
        store
            .insert(Grade::new(id, sid, subject, 85.0, date, semester))
            .unwrap();
    }

    let spring_window = store
        .range_by_index("date", "2026-01-01", "2026-03-01")
        .unwrap();
    assert_eq!(spring_window.len(), 3);
    assert!(spring_window.windows(2).all(|w| w[0].recorded_on <= w[1].recorded_on));

    // Combined filters narrow by intersection
    let hits = store.search(&[("subject", "Math"), ("student", "S2")]);
    let ids: HashSet<&str> = hits.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, HashSet::from(["G3", "G4"]));

    let hits = store.search(&[("subject", "Math"), ("semester", "2026-Fall")]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "G4");
}

#[test]
fn test_store_built_from_config() {
    let config = CoreConfig::from_toml("[store]\nstats_ttl_ms = 1000\n").unwrap();
    let store: IndexedStore<Student> = IndexedStore::with_stats_ttl(
        vec![IndexDescriptor::hashed("kind", |s: &Student| {
            Some(s.kind.as_str().to_string())
        })],
        config.stats_ttl(),
    );

    store
        .insert(student("S1", "Ada", "ada@example.edu", StudentKind::Honors))
        .unwrap();
    let metrics = store.metrics();
    assert_eq!(metrics.total_entities, 1);
    assert_eq!(metrics.index_buckets["kind"], 1);
}
