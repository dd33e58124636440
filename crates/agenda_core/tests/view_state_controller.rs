mod common;

use agenda_core::reminder::ReminderRequest;
use agenda_core::{
    Attachments, MutationHook, MutationKind, MutationOutcome, Note, NoteController,
    NoteRepository, RecordId, ReminderScheduler, ReminderSync, Store, Task, TaskController,
    TaskRepository, ViewStateController,
};
use common::{refs, settle};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn note_controller() -> NoteController {
    NoteController::new(NoteRepository::new(Store::open_in_memory().unwrap()))
}

#[tokio::test]
async fn collection_is_empty_before_any_write() {
    let controller = note_controller();
    let mut collection = controller.collection();
    assert!(collection.current().is_empty());
    assert!(settle(&mut collection, |_| true).await.is_empty());
}

#[tokio::test]
async fn fire_and_forget_mutations_apply_in_queue_order() {
    let controller = note_controller();
    let mut collection = controller.collection();

    // Handles are dropped on purpose.
    drop(controller.add(Note::new("one", "")));
    drop(controller.add(Note::new("two", "")));
    drop(controller.add(Note::new("three", "")));

    let notes = settle(&mut collection, |notes| notes.len() == 3).await;
    let titles: Vec<_> = notes.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);

    let mut renamed = notes[1].clone();
    renamed.title = "two (renamed)".to_string();
    controller.update(renamed);
    controller.delete(notes[0].clone());

    let notes = settle(&mut collection, |notes| notes.len() == 2).await;
    let titles: Vec<_> = notes.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["two (renamed)", "three"]);
}

#[tokio::test]
async fn mutation_handle_reports_outcome() {
    let controller = note_controller();

    let outcome = controller
        .add(Note::new("tracked", ""))
        .completed()
        .await
        .unwrap();
    let MutationOutcome::Inserted(id) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };

    let mut note = controller.repository().get(id).await.unwrap().unwrap();
    note.description = "edited".to_string();
    assert_eq!(
        controller.update(note.clone()).completed().await.unwrap(),
        MutationOutcome::Updated { applied: true }
    );
    assert_eq!(
        controller.delete(note.clone()).completed().await.unwrap(),
        MutationOutcome::Deleted { applied: true }
    );
    assert_eq!(
        controller.delete(note).completed().await.unwrap(),
        MutationOutcome::Deleted { applied: false }
    );
}

#[tokio::test]
async fn rejected_mutation_is_published_and_later_ones_still_apply() {
    let controller = note_controller();
    let mut failures = controller.failures();
    let mut collection = controller.collection();

    let bad = Note::new("bad", "").with_attachments(Attachments::from_parts(
        refs(&["a,b.jpg"]),
        Vec::new(),
        Vec::new(),
    ));
    controller.add(bad);
    controller.add(Note::new("good", ""));

    let failure = tokio::time::timeout(Duration::from_secs(5), failures.recv())
        .await
        .expect("failure should be published")
        .unwrap();
    assert_eq!(failure.kind, MutationKind::Add);
    assert_eq!(failure.entity, "note");
    assert_eq!(failure.record_id, 0);
    assert!(!failure.retryable);
    assert!(failure.message.contains("separator"));

    let notes = settle(&mut collection, |notes| notes.len() == 1).await;
    assert_eq!(notes[0].title, "good");
}

#[tokio::test]
async fn search_view_follows_controller_writes() {
    let controller = note_controller();
    let mut matches = controller.search("MEET");

    controller.add(Note::new("Team meeting", ""));
    controller.add(Note::new("Lunch", ""));
    controller.add(Note::new("Notes", "meet at noon"));

    let found = settle(&mut matches, |notes| notes.len() == 2).await;
    assert!(found.iter().all(|note| note.title != "Lunch"));
}

#[derive(Default)]
struct RecordingScheduler {
    scheduled: Mutex<Vec<ReminderRequest>>,
    cancelled: Mutex<Vec<RecordId>>,
}

impl ReminderScheduler for RecordingScheduler {
    fn schedule(&self, request: &ReminderRequest) {
        self.scheduled.lock().unwrap().push(request.clone());
    }

    fn cancel(&self, task_id: RecordId) {
        self.cancelled.lock().unwrap().push(task_id);
    }
}

fn fixed_now() -> i64 {
    1_000
}

#[tokio::test]
async fn task_mutations_drive_reminder_scheduler() {
    let scheduler = Arc::new(RecordingScheduler::default());
    let hook: Arc<dyn MutationHook<Task>> =
        Arc::new(ReminderSync::with_clock(Arc::clone(&scheduler), fixed_now));
    let controller: TaskController = ViewStateController::with_hooks(
        TaskRepository::new(Store::open_in_memory().unwrap()),
        vec![hook],
        8,
    );

    let outcome = controller
        .add(Task::new("Pay rent", "", 50_000))
        .completed()
        .await
        .unwrap();
    let MutationOutcome::Inserted(id) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    {
        let scheduled = scheduler.scheduled.lock().unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].task_id, id);
        assert_eq!(scheduled[0].fire_at, 50_000);
        assert_eq!(scheduled[0].title, "Pay rent");
    }

    let task = controller.repository().get(id).await.unwrap().unwrap();
    controller
        .set_completed(&task, true)
        .completed()
        .await
        .unwrap();
    assert_eq!(*scheduler.cancelled.lock().unwrap(), vec![id]);

    let mut pending = controller.pending();
    assert!(settle(&mut pending, |_| true).await.is_empty());
}
