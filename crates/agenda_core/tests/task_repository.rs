mod common;

use agenda_core::{parse_due_date, AttachmentKind, Store, Task, TaskRepository};
use chrono::Utc;
use common::settle;

fn repository() -> TaskRepository {
    TaskRepository::new(Store::open_in_memory().unwrap())
}

#[tokio::test]
async fn task_fields_survive_storage() {
    let repo = repository();
    let due = parse_due_date("15/06/2031 10:30", &Utc).unwrap();
    let mut task = Task::new("Dentist", "Bring x-rays", due).with_reminder(due - 3_600_000);
    task.attachments
        .push(AttachmentKind::Video, "content://video/7");

    let id = repo.add(&task).await.unwrap();
    let stored = repo.get(id).await.unwrap().expect("task should exist");

    assert_eq!(stored.due_date, due);
    assert_eq!(stored.reminder_date, Some(due - 3_600_000));
    assert!(!stored.is_completed);
    assert_eq!(stored.attachments, task.attachments);
}

#[tokio::test]
async fn set_completed_replaces_flag_and_updates_views() {
    let repo = repository();
    let id = repo.add(&Task::new("write report", "", 1_000)).await.unwrap();
    let mut single = repo.by_id(id);
    let task = settle(&mut single, Option::is_some).await.unwrap();

    assert!(repo.set_completed(&task, true).await.unwrap());
    let done = settle(&mut single, |task| {
        task.as_ref().is_some_and(|task| task.is_completed)
    })
    .await
    .unwrap();
    assert_eq!(done.title, "write report");

    assert!(repo.set_completed(&done, false).await.unwrap());
    let reopened = repo.get(id).await.unwrap().unwrap();
    assert!(!reopened.is_completed);
}

#[tokio::test]
async fn pending_lists_only_open_tasks_in_id_order() {
    let repo = repository();
    let first = repo.add(&Task::new("first", "", 10)).await.unwrap();
    let second = repo.add(&Task::new("second", "", 5)).await.unwrap();
    repo.add(&Task::new("third", "", 1)).await.unwrap();

    let mut pending = repo.pending();
    let open = settle(&mut pending, |tasks| tasks.len() == 3).await;
    let ids: Vec<_> = open.iter().map(|task| task.id).collect();
    assert_eq!(&ids[..2], &[first, second]);

    let second_task = repo.get(second).await.unwrap().unwrap();
    repo.set_completed(&second_task, true).await.unwrap();

    let open = settle(&mut pending, |tasks| tasks.len() == 2).await;
    let titles: Vec<_> = open.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "third"]);
}

#[tokio::test]
async fn non_zero_completion_values_read_as_done() {
    let repo = repository();
    let id = repo.add(&Task::new("imported", "", 0)).await.unwrap();

    repo.store()
        .with_connection(|conn| {
            conn.execute("UPDATE tasks SET is_completed = 7 WHERE id = ?1;", [id])?;
            Ok(())
        })
        .unwrap();

    assert!(repo.get(id).await.unwrap().unwrap().is_completed);
}

#[tokio::test]
async fn search_covers_tasks_too() {
    let repo = repository();
    repo.add(&Task::new("Call plumber", "", 0)).await.unwrap();
    repo.add(&Task::new("Pay bills", "before the PLUMBER visit", 0))
        .await
        .unwrap();
    repo.add(&Task::new("Gym", "", 0)).await.unwrap();

    let mut results = repo.search("Plumber");
    let found = settle(&mut results, |tasks| tasks.len() == 2).await;
    assert!(found.iter().all(|task| task.title != "Gym"));
}
