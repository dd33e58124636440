mod common;

use agenda_core::{
    AttachmentKind, Attachments, Note, NoteRepository, RepoError, Store, ValidationError,
};
use common::{refs, settle};

fn repository() -> NoteRepository {
    NoteRepository::new(Store::open_in_memory().unwrap())
}

fn titles(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|note| note.title.as_str()).collect()
}

#[tokio::test]
async fn inserted_note_is_readable_with_its_attachments() {
    let repo = repository();
    let mut attachments = Attachments::new();
    attachments.push(AttachmentKind::Image, "content://img/1");
    attachments.push(AttachmentKind::Audio, "file:///voice.m4a");
    let note = Note::new("Groceries", "milk, eggs").with_attachments(attachments.clone());

    let id = repo.add(&note).await.unwrap();
    assert!(id > 0);

    let stored = repo.get(id).await.unwrap().expect("note should exist");
    assert_eq!(stored.id, id);
    assert_eq!(stored.title, "Groceries");
    assert_eq!(stored.description, "milk, eggs");
    assert_eq!(stored.attachments, attachments);
}

#[tokio::test]
async fn live_list_starts_empty_and_follows_writes() {
    let repo = repository();
    let mut all = repo.all();
    assert!(all.current().is_empty());

    let first = repo.add(&Note::new("first", "")).await.unwrap();
    let second = repo.add(&Note::new("second", "")).await.unwrap();
    let notes = settle(&mut all, |notes| notes.len() == 2).await;
    assert_eq!(titles(&notes), vec!["first", "second"]);
    assert!(first < second);

    let mut edited = notes[0].clone();
    edited.title = "first (edited)".to_string();
    assert!(repo.update(&edited).await.unwrap());
    let notes = settle(&mut all, |notes| {
        notes.first().map(|note| note.title.as_str()) == Some("first (edited)")
    })
    .await;
    assert_eq!(titles(&notes), vec!["first (edited)", "second"]);
}

#[tokio::test]
async fn delete_removes_note_from_list_and_single_view() {
    let repo = repository();
    let id = repo.add(&Note::new("to delete", "")).await.unwrap();
    let mut single = repo.by_id(id);
    let mut all = repo.all();
    let note = settle(&mut single, Option::is_some).await.unwrap();
    settle(&mut all, |notes| notes.len() == 1).await;

    assert!(repo.delete(&note).await.unwrap());

    settle(&mut single, Option::is_none).await;
    settle(&mut all, Vec::is_empty).await;
    assert!(repo.get(id).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_or_unsaved_ids_are_noops() {
    let repo = repository();
    repo.add(&Note::new("kept", "")).await.unwrap();

    let mut ghost = Note::new("ghost", "");
    ghost.id = 999;
    assert!(!repo.update(&ghost).await.unwrap());
    assert!(!repo.delete(&ghost).await.unwrap());

    let unsaved = Note::new("unsaved", "");
    assert!(!repo.update(&unsaved).await.unwrap());
    assert!(!repo.delete(&unsaved).await.unwrap());

    assert_eq!(titles(&repo.list().await.unwrap()), vec!["kept"]);
}

#[tokio::test]
async fn invalid_references_are_rejected_before_storage() {
    let repo = repository();
    let note = Note::new("bad", "").with_attachments(Attachments::from_parts(
        refs(&["a|b.jpg"]),
        Vec::new(),
        Vec::new(),
    ));

    let err = repo.add(&note).await.unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::ReservedSeparator { .. })
    ));
    assert!(!err.is_storage_failure());
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn garbage_attachment_columns_still_load() {
    let repo = repository();
    let damaged_id = repo.add(&Note::new("damaged", "")).await.unwrap();
    let healthy = Note::new("healthy", "").with_attachments(Attachments::from_parts(
        refs(&["content://img/1"]),
        Vec::new(),
        Vec::new(),
    ));
    let healthy_id = repo.add(&healthy).await.unwrap();

    let mut all = repo.all();
    let mut damaged = repo.by_id(damaged_id);
    settle(&mut all, |notes| notes.len() == 2).await;
    settle(&mut damaged, Option::is_some).await;

    repo.store()
        .with_connection(|conn| {
            conn.execute(
                "UPDATE notes SET image_refs = '[\"broken', video_refs = '', \
                 audio_refs = 'a.mp3,b.mp3' WHERE id = ?1;",
                [damaged_id],
            )?;
            Ok(())
        })
        .unwrap();

    let note = settle(&mut damaged, |note| {
        note.as_ref()
            .is_some_and(|note| note.attachments.audio.len() == 2)
    })
    .await
    .unwrap();
    assert!(note.attachments.images.is_empty());
    assert!(note.attachments.videos.is_empty());
    assert_eq!(note.attachments.audio, refs(&["a.mp3", "b.mp3"]));
    settle(&mut all, |notes| {
        notes.len() == 2 && notes[0].attachments.audio.len() == 2
    })
    .await;

    repo.store()
        .with_connection(|conn| {
            conn.execute(
                "UPDATE notes SET audio_refs = X'FF00FE' WHERE id = ?1;",
                [damaged_id],
            )?;
            Ok(())
        })
        .unwrap();

    let note = settle(&mut damaged, |note| {
        note.as_ref()
            .is_some_and(|note| note.attachments.is_empty())
    })
    .await
    .unwrap();
    assert_eq!(note.title, "damaged");

    let notes = settle(&mut all, |notes| {
        notes.len() == 2 && notes[0].attachments.is_empty()
    })
    .await;
    assert_eq!(notes[1].id, healthy_id);
    assert_eq!(notes[1].attachments, healthy.attachments);

    let listed = repo.list().await.unwrap();
    assert_eq!(titles(&listed), vec!["damaged", "healthy"]);
    assert!(repo.get(damaged_id).await.unwrap().is_some());
}

#[tokio::test]
async fn search_matches_title_or_description_ignoring_case() {
    let repo = repository();
    repo.add(&Note::new("Shopping List", "")).await.unwrap();
    repo.add(&Note::new("Ideas", "buy a new LIST holder")).await.unwrap();
    repo.add(&Note::new("Travel", "passport")).await.unwrap();

    let mut results = repo.search("list");
    let found = settle(&mut results, |notes| notes.len() == 2).await;
    assert_eq!(titles(&found), vec!["Shopping List", "Ideas"]);

    let mut everything = repo.search("   ");
    settle(&mut everything, |notes| notes.len() == 3).await;
}
