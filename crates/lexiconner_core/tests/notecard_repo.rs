use lexiconner_core::{
    NotecardKey, NotecardRepository, RepoError, SqliteNotecardRepository, QUIZ_CHOICES,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn seeded_repo() -> SqliteNotecardRepository {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    repo.add(0, "cat", "gato").unwrap();
    repo.add(1, "dog", "perro").unwrap();
    repo.add(2, "bird", "pajaro").unwrap();
    repo
}

#[test]
fn smallest_available_id_tracks_inserts() {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    assert_eq!(repo.smallest_available_id().unwrap(), 0);

    repo.add(0, "cat", "gato").unwrap();
    assert_eq!(repo.smallest_available_id().unwrap(), 1);

    repo.add(1, "dog", "perro").unwrap();
    repo.add(2, "bird", "pajaro").unwrap();
    assert_eq!(repo.smallest_available_id().unwrap(), 3);
}

#[test]
fn smallest_available_id_fills_holes_first() {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    for id in [0, 1, 2, 5] {
        repo.add(id, "front", "back").unwrap();
    }

    repo.delete(1).unwrap();
    assert_eq!(repo.smallest_available_id().unwrap(), 1);

    repo.add(1, "again", "back").unwrap();
    assert_eq!(repo.smallest_available_id().unwrap(), 3);
}

#[test]
fn add_then_get_by_id_roundtrip() {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    assert_eq!(repo.add(4, "house", "casa").unwrap(), 4);

    let loaded = repo.get_by_id(4).unwrap();
    assert_eq!(loaded.id, 4);
    assert_eq!(loaded.front, "house");
    assert_eq!(loaded.back, "casa");
}

#[test]
fn add_with_taken_id_returns_duplicate_id_and_keeps_original() {
    let repo = seeded_repo();

    let err = repo.add(1, "wolf", "lobo").unwrap_err();
    assert!(matches!(err, RepoError::DuplicateId(1)));

    let kept = repo.get_by_id(1).unwrap();
    assert_eq!((kept.front.as_str(), kept.back.as_str()), ("dog", "perro"));
    assert_eq!(repo.count().unwrap(), 3);
}

#[test]
fn get_by_id_missing_returns_not_found() {
    let repo = seeded_repo();
    let err = repo.get_by_id(42).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(NotecardKey::Id(42))));
}

#[test]
fn edit_only_front_keeps_back() {
    let repo = seeded_repo();

    repo.edit(0, Some("kitten"), None).unwrap();

    let loaded = repo.get_by_id(0).unwrap();
    assert_eq!(loaded.front, "kitten");
    assert_eq!(loaded.back, "gato");
}

#[test]
fn edit_only_back_keeps_front() {
    let repo = seeded_repo();

    repo.edit(1, None, Some("perrito")).unwrap();

    let loaded = repo.get_by_id(1).unwrap();
    assert_eq!(loaded.front, "dog");
    assert_eq!(loaded.back, "perrito");
}

#[test]
fn edit_treats_empty_strings_as_unset() {
    let repo = seeded_repo();

    repo.edit(2, Some(""), Some("")).unwrap();
    repo.edit(2, None, None).unwrap();
    repo.edit(2, Some(""), Some("ave")).unwrap();

    let loaded = repo.get_by_id(2).unwrap();
    assert_eq!(loaded.front, "bird");
    assert_eq!(loaded.back, "ave");
}

#[test]
fn edit_missing_id_returns_not_found() {
    let repo = seeded_repo();
    let err = repo.edit(9, None, None).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(NotecardKey::Id(9))));
}

#[test]
fn delete_then_get_returns_not_found_and_absent_delete_is_noop() {
    let repo = seeded_repo();

    repo.delete(0).unwrap();
    assert!(matches!(
        repo.get_by_id(0),
        Err(RepoError::NotFound(NotecardKey::Id(0)))
    ));

    repo.delete(0).unwrap();
    repo.delete(77).unwrap();
    assert_eq!(repo.count().unwrap(), 2);
}

#[test]
fn count_follows_add_and_delete() {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    assert_eq!(repo.count().unwrap(), 0);

    repo.add(0, "sun", "sol").unwrap();
    assert_eq!(repo.count().unwrap(), 1);
    repo.add(1, "moon", "luna").unwrap();
    assert_eq!(repo.count().unwrap(), 2);

    repo.delete(0).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
    repo.delete(0).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn lookup_returns_back_or_not_found() {
    let repo = seeded_repo();

    assert_eq!(repo.lookup("dog").unwrap(), "perro");

    let err = repo.lookup("fish").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(NotecardKey::Front(front)) if front == "fish"));
}

#[test]
fn random_notecard_requires_one_row() {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    assert!(matches!(
        repo.random_notecard(),
        Err(RepoError::InsufficientData {
            required: 1,
            available: 0
        })
    ));

    repo.add(8, "tree", "arbol").unwrap();
    let card = repo.random_notecard().unwrap();
    assert_eq!(card.id, 8);
    assert_eq!(card.back, "arbol");
}

#[test]
fn random_question_requires_three_notecards() {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    repo.add(0, "cat", "gato").unwrap();
    repo.add(1, "dog", "perro").unwrap();

    let err = repo.random_question().unwrap_err();
    assert!(matches!(
        err,
        RepoError::InsufficientData {
            required: 3,
            available: 2
        }
    ));
}

#[test]
fn random_question_places_matching_back_at_answer_index() {
    let repo = seeded_repo();
    let fronts: HashSet<&str> = ["cat", "dog", "bird"].into_iter().collect();
    let mut rng = StdRng::seed_from_u64(7);
    let mut seen_slots = HashSet::new();

    for _ in 0..200 {
        let question = repo.random_question_with(&mut rng).unwrap();
        assert_eq!(question.choices.len(), QUIZ_CHOICES);
        assert!(question.answer_index < QUIZ_CHOICES);
        assert!(fronts.contains(question.prompt.as_str()));
        assert_eq!(question.answer(), repo.lookup(&question.prompt).unwrap());

        let distinct: HashSet<&String> = question.choices.iter().collect();
        assert_eq!(distinct.len(), QUIZ_CHOICES);
        seen_slots.insert(question.answer_index);
    }

    assert_eq!(seen_slots.len(), QUIZ_CHOICES);
}

#[test]
fn random_question_does_not_deduplicate_choice_text() {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    repo.add(0, "big", "grande").unwrap();
    repo.add(1, "large", "grande").unwrap();
    repo.add(2, "great", "grande").unwrap();

    let question = repo.random_question().unwrap();
    assert!(question.choices.iter().all(|choice| choice == "grande"));
}

#[test]
fn list_returns_all_rows_ordered_by_id() {
    let repo = SqliteNotecardRepository::open_in_memory().unwrap();
    repo.add(2, "bird", "pajaro").unwrap();
    repo.add(0, "cat", "gato").unwrap();
    repo.add(1, "dog", "perro").unwrap();

    let ids: Vec<_> = repo.list().unwrap().into_iter().map(|card| card.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn ensure_schema_is_idempotent() {
    let repo = seeded_repo();
    repo.ensure_schema().unwrap();
    repo.ensure_schema().unwrap();
    assert_eq!(repo.count().unwrap(), 3);
    assert_eq!(repo.storage().unobserved_faults(), 0);
}

#[test]
fn operations_after_close_fail_with_connection_closed() {
    let repo = seeded_repo();
    repo.close().unwrap();
    assert!(repo.is_closed());

    assert!(matches!(repo.count(), Err(RepoError::ConnectionClosed)));
    assert!(matches!(
        repo.add(3, "fish", "pez"),
        Err(RepoError::ConnectionClosed)
    ));
    assert!(matches!(repo.delete(0), Err(RepoError::ConnectionClosed)));
    assert!(matches!(
        repo.random_question(),
        Err(RepoError::ConnectionClosed)
    ));
    assert!(matches!(repo.close(), Err(RepoError::ConnectionClosed)));
}

#[test]
fn data_survives_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Lexiconner.db");

    let repo = SqliteNotecardRepository::open(&path).unwrap();
    repo.add(0, "cat", "gato").unwrap();
    repo.add(1, "dog", "perro").unwrap();
    repo.edit(1, None, Some("perrito")).unwrap();
    repo.delete(0).unwrap();
    repo.close_and_wait().unwrap();

    let reopened = SqliteNotecardRepository::open(&path).unwrap();
    assert_eq!(reopened.count().unwrap(), 1);
    assert_eq!(reopened.get_by_id(1).unwrap().back, "perrito");
    assert_eq!(reopened.smallest_available_id().unwrap(), 0);
}
