use chrono::{NaiveDate, NaiveDateTime};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

use organizer::bootstrap;
use organizer::codec::CodecError;
use organizer::database::{Database, DatabaseError, Table};
use organizer::models::{
    Attachment, AttachmentType, Book, BookStatus, ChecklistItem, EntryType, JournalEntry, Mood, Priority,
    Project, ProjectCategory, ProjectTodo, Subtask, Task, WritingEntry,
};
use organizer::repository::{Repositories, RepositoryError, Subscription};

// Helper to open a fresh on-disk database; the TempDir must outlive it
fn create_temp_repos() -> (TempDir, Database, Repositories) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("organizer.db");
    let db = Database::new(path.to_str().unwrap()).unwrap();
    let repos = Repositories::new(&db);
    (dir, db, repos)
}

async fn next<T>(subscription: &mut Subscription<T>) -> T {
    timeout(Duration::from_secs(5), subscription.next())
        .await
        .expect("subscription timed out")
        .expect("subscription ended")
        .expect("query failed")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn task(title: &str, due: Option<NaiveDateTime>, priority: Priority) -> Task {
    let mut task = Task::new(title.to_string());
    task.due_date = due;
    task.priority = priority;
    task
}

#[tokio::test(flavor = "multi_thread")]
async fn test_task_round_trip() {
    let (_dir, _db, repos) = create_temp_repos();

    let mut full = task("Write report", Some(day(2024, 5, 1)), Priority::Urgent);
    full.description = Some("Quarterly numbers".to_string());
    full.category = "Work".to_string();
    full.subtasks = vec![
        Subtask {
            title: "Collect data".to_string(),
            is_completed: true,
        },
        Subtask {
            title: "Draft".to_string(),
            is_completed: false,
        },
    ];
    let bare = Task::new("Nothing else".to_string());

    for original in [full, bare] {
        let id = repos.tasks.insert(&original).await.unwrap();
        let stored = repos.tasks.get(id).await.unwrap().unwrap();
        assert_eq!(stored, Task { id: Some(id), ..original });
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_incomplete_tasks_order_by_due_date_then_priority() {
    let (_dir, _db, repos) = create_temp_repos();

    for t in [
        task("d", None, Priority::Urgent),
        task("c", Some(day(2024, 1, 2)), Priority::Urgent),
        task("b", Some(day(2024, 1, 1)), Priority::Low),
        task("a", Some(day(2024, 1, 1)), Priority::High),
    ] {
        repos.tasks.insert(&t).await.unwrap();
    }
    let mut done = task("done", Some(day(2023, 12, 31)), Priority::High);
    done.is_completed = true;
    repos.tasks.insert(&done).await.unwrap();

    let titles: Vec<String> = next(&mut repos.tasks.observe_incomplete())
        .await
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["a", "b", "c", "d"]);

    let completed = next(&mut repos.tasks.observe_completed()).await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].title, "done");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_toggle_task_completion() {
    let (_dir, _db, repos) = create_temp_repos();
    let id = repos
        .tasks
        .insert(&task("Call mom", Some(day(2024, 2, 2)), Priority::High))
        .await
        .unwrap();
    let before = repos.tasks.get(id).await.unwrap().unwrap();

    assert!(repos.tasks.toggle_completion(id).await.unwrap());
    let after = repos.tasks.get(id).await.unwrap().unwrap();
    assert!(after.is_completed);
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(after.title, before.title);
    assert_eq!(after.due_date, before.due_date);
    assert_eq!(after.priority, before.priority);
    assert_eq!(after.created_at, before.created_at);

    assert!(repos.tasks.toggle_completion(id).await.unwrap());
    assert!(!repos.tasks.get(id).await.unwrap().unwrap().is_completed);

    // Missing ids touch nothing
    assert!(!repos.tasks.toggle_completion(id + 100).await.unwrap());
    assert!(!repos.tasks.delete(id + 100).await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_requires_persisted_task() {
    let (_dir, _db, repos) = create_temp_repos();

    let err = repos.tasks.update(&Task::new("never stored".to_string())).await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidValue { .. }));

    let id = repos.tasks.insert(&Task::new("old".to_string())).await.unwrap();
    let mut stored = repos.tasks.get(id).await.unwrap().unwrap();
    stored.title = "new".to_string();
    assert!(repos.tasks.update(&stored).await.unwrap());

    let updated = repos.tasks.get(id).await.unwrap().unwrap();
    assert_eq!(updated.title, "new");
    assert!(updated.updated_at >= stored.updated_at);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_todo_toggle_stamps_and_clears_completed_at() {
    let (_dir, _db, repos) = create_temp_repos();
    let project_id = repos
        .projects
        .insert(&Project::new("Thesis".to_string(), ProjectCategory::Academic))
        .await
        .unwrap();
    let mut todo = ProjectTodo::new(project_id, "Outline".to_string());
    todo.priority = Priority::High;
    let todo_id = repos.projects.insert_todo(&todo).await.unwrap();

    assert!(repos.projects.toggle_todo(todo_id).await.unwrap());
    let done = repos.projects.get_todo(todo_id).await.unwrap().unwrap();
    assert!(done.is_completed);
    assert!(done.completed_at.is_some());
    assert_eq!(repos.projects.todo_counts(project_id).await.unwrap(), (1, 1));

    assert!(repos.projects.toggle_todo(todo_id).await.unwrap());
    let reopened = repos.projects.get_todo(todo_id).await.unwrap().unwrap();
    assert!(!reopened.is_completed);
    assert_eq!(reopened.completed_at, None);
    assert_eq!(reopened.title, "Outline");
    assert_eq!(reopened.priority, Priority::High);
    assert_eq!(reopened.created_at, done.created_at);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_project_completion_and_progress() {
    let (_dir, _db, repos) = create_temp_repos();
    let id = repos
        .projects
        .insert(&Project::new("Portfolio".to_string(), ProjectCategory::Career))
        .await
        .unwrap();

    let err = repos.projects.update_progress(id, 101).await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidValue { .. }));
    assert!(repos.projects.update_progress(id, 55).await.unwrap());

    assert!(repos.projects.toggle_completion(id).await.unwrap());
    let completed = repos.projects.get(id).await.unwrap().unwrap();
    assert!(completed.is_completed);
    assert!(completed.completed_date.is_some());
    assert_eq!(completed.progress_percentage, 55);
    assert_eq!(next(&mut repos.projects.observe_completed()).await.len(), 1);
    assert!(next(&mut repos.projects.observe_active()).await.is_empty());

    assert!(repos.projects.toggle_completion(id).await.unwrap());
    let reopened = repos.projects.get(id).await.unwrap().unwrap();
    assert!(!reopened.is_completed);
    assert_eq!(reopened.completed_date, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deleting_project_removes_its_todos() {
    let (_dir, _db, repos) = create_temp_repos();
    let project_id = repos
        .projects
        .insert(&Project::new("Garden".to_string(), ProjectCategory::Personal))
        .await
        .unwrap();
    let keep_id = repos
        .projects
        .insert(&Project::new("Other".to_string(), ProjectCategory::Other))
        .await
        .unwrap();
    let first = repos
        .projects
        .insert_todo(&ProjectTodo::new(project_id, "Dig".to_string()))
        .await
        .unwrap();
    repos
        .projects
        .insert_todo(&ProjectTodo::new(project_id, "Plant".to_string()))
        .await
        .unwrap();
    repos
        .projects
        .insert_todo(&ProjectTodo::new(keep_id, "Unrelated".to_string()))
        .await
        .unwrap();

    let mut todos = repos.projects.observe_todos(project_id);
    assert_eq!(next(&mut todos).await.len(), 2);

    assert!(repos.projects.delete(project_id).await.unwrap());

    assert!(next(&mut todos).await.is_empty());
    assert!(repos.projects.get(project_id).await.unwrap().is_none());
    assert!(repos.projects.get_todo(first).await.unwrap().is_none());
    assert_eq!(repos.projects.todo_counts(project_id).await.unwrap(), (0, 0));
    assert_eq!(repos.projects.todo_counts(keep_id).await.unwrap(), (1, 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_todo_for_missing_project_is_rejected() {
    let (_dir, _db, repos) = create_temp_repos();

    let err = repos
        .projects
        .insert_todo(&ProjectTodo::new(4242, "Orphan".to_string()))
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");
    assert!(err.is_foreign_key_violation(), "unexpected error: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deleting_todos_by_project_keeps_project() {
    let (_dir, _db, repos) = create_temp_repos();
    let cleared_id = repos
        .projects
        .insert(&Project::new("Kitchen".to_string(), ProjectCategory::Personal))
        .await
        .unwrap();
    let other_id = repos
        .projects
        .insert(&Project::new("Thesis".to_string(), ProjectCategory::Academic))
        .await
        .unwrap();
    for title in ["Measure", "Order tiles"] {
        repos
            .projects
            .insert_todo(&ProjectTodo::new(cleared_id, title.to_string()))
            .await
            .unwrap();
    }
    let untouched = repos
        .projects
        .insert_todo(&ProjectTodo::new(other_id, "Outline".to_string()))
        .await
        .unwrap();

    let mut todos = repos.projects.observe_todos(cleared_id);
    assert_eq!(next(&mut todos).await.len(), 2);

    assert_eq!(repos.projects.delete_todos_for_project(cleared_id).await.unwrap(), 2);

    assert!(next(&mut todos).await.is_empty());
    assert!(repos.projects.get(cleared_id).await.unwrap().is_some());
    assert_eq!(repos.projects.todo_counts(cleared_id).await.unwrap(), (0, 0));
    assert!(repos.projects.get_todo(untouched).await.unwrap().is_some());
    assert_eq!(repos.projects.todo_counts(other_id).await.unwrap(), (1, 0));

    // Nothing left to remove
    assert_eq!(repos.projects.delete_todos_for_project(cleared_id).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_subscriber_receives_new_incomplete_task() {
    let (_dir, _db, repos) = create_temp_repos();
    let mut incomplete = repos.tasks.observe_incomplete();
    assert!(next(&mut incomplete).await.is_empty());

    let id = repos.tasks.insert(&Task::new("fresh".to_string())).await.unwrap();

    let update = next(&mut incomplete).await;
    assert_eq!(update.iter().map(|t| t.id).collect::<Vec<_>>(), vec![Some(id)]);

    // A read issued after the insert sees it too
    let later = next(&mut repos.tasks.observe_incomplete()).await;
    assert_eq!(later.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unrelated_commits_do_not_rerun_queries() {
    let (_dir, _db, repos) = create_temp_repos();
    let mut tasks = repos.tasks.observe_all();
    assert!(next(&mut tasks).await.is_empty());

    repos
        .books
        .insert(&Book::new("Dune".to_string(), "Frank Herbert".to_string()))
        .await
        .unwrap();
    repos.tasks.insert(&Task::new("only".to_string())).await.unwrap();

    // Exactly one delivery: the task insert
    assert_eq!(next(&mut tasks).await.len(), 1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(tasks.try_next().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_subscription_stops() {
    let (_dir, _db, repos) = create_temp_repos();
    let mut books = repos.books.observe_all();
    assert!(next(&mut books).await.is_empty());
    assert!(books.is_active());
    books.cancel();

    // Writes carry on without a live subscriber
    repos
        .books
        .insert(&Book::new("Emma".to_string(), "Jane Austen".to_string()))
        .await
        .unwrap();
    assert_eq!(next(&mut repos.books.observe_all()).await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_structured_list_is_reported() {
    let (_dir, db, repos) = create_temp_repos();
    let id = db
        .write(&[Table::WritingEntries], |conn| -> Result<i64, DatabaseError> {
            conn.execute(
                "INSERT INTO writing_entries (title, content, entry_type, tags, created_at)
                 VALUES ('broken', '', 'NOTE', 'not json', '2024-01-01T00:00:00')",
                [],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .unwrap();

    let err = repos.writing.get(id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Codec(CodecError::MalformedStructuredList {
            column: "writing_entries.tags",
            ..
        })
    ));

    let mut all = repos.writing.observe_all();
    let delivered = timeout(Duration::from_secs(5), all.next()).await.unwrap().unwrap();
    assert!(matches!(delivered, Err(RepositoryError::Codec(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_stored_enumeration_is_reported() {
    let (_dir, db, repos) = create_temp_repos();
    let id = db
        .write(&[Table::Books], |conn| -> Result<i64, DatabaseError> {
            conn.execute(
                "INSERT INTO books (title, author, status, created_at, updated_at)
                 VALUES ('Lent out', 'Someone', 'LENT', '2024-01-01T00:00:00', '2024-01-01T00:00:00')",
                [],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .unwrap();

    let err = repos.books.get(id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Codec(CodecError::MalformedEnumeration { kind: "book status", .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_out_of_range_stored_integers_are_reported() {
    let (_dir, db, repos) = create_temp_repos();
    let id = db
        .write(&[Table::Books], |conn| -> Result<i64, DatabaseError> {
            conn.execute(
                "INSERT INTO books (title, author, status, total_pages, created_at, updated_at)
                 VALUES ('Torn', 'Someone', 'READING', -5, '2024-01-01T00:00:00', '2024-01-01T00:00:00')",
                [],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .unwrap();

    let err = repos.books.get(id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Codec(CodecError::OutOfRange {
            column: "books.total_pages",
            value: -5
        })
    ));

    db.write(&[Table::Books], move |conn| -> Result<usize, DatabaseError> {
        Ok(conn.execute(
            "UPDATE books SET total_pages = 100, pages_read = 5000000000 WHERE id = ?1",
            [id],
        )?)
    })
    .await
    .unwrap();

    let err = repos.books.get(id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Codec(CodecError::OutOfRange {
            column: "books.pages_read",
            value: 5_000_000_000
        })
    ));

    let mut all = repos.books.observe_all();
    let delivered = timeout(Duration::from_secs(5), all.next()).await.unwrap().unwrap();
    assert!(matches!(delivered, Err(RepositoryError::Codec(CodecError::OutOfRange { .. }))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_book_status_transitions() {
    let (_dir, _db, repos) = create_temp_repos();
    let mut book = Book::new("Middlemarch".to_string(), "George Eliot".to_string());
    book.total_pages = Some(880);
    let id = repos.books.insert(&book).await.unwrap();

    assert!(repos.books.set_status(id, BookStatus::Reading).await.unwrap());
    let reading = repos.books.get(id).await.unwrap().unwrap();
    let started = reading.started_date.expect("start stamped");
    assert_eq!(reading.completed_date, None);
    assert_eq!(next(&mut repos.books.observe_reading()).await.len(), 1);

    assert!(repos.books.update_pages_read(id, 880).await.unwrap());
    assert!(repos.books.set_status(id, BookStatus::Completed).await.unwrap());
    let finished = repos.books.get(id).await.unwrap().unwrap();
    assert_eq!(finished.started_date, Some(started));
    assert!(finished.completed_date.is_some());
    assert_eq!(finished.progress_percent(), Some(100));

    assert!(repos.books.set_status(id, BookStatus::Reading).await.unwrap());
    let reread = repos.books.get(id).await.unwrap().unwrap();
    assert_eq!(reread.started_date, Some(started));
    assert_eq!(reread.completed_date, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_book_rating_is_validated() {
    let (_dir, _db, repos) = create_temp_repos();
    let id = repos
        .books
        .insert(&Book::new("Ulysses".to_string(), "James Joyce".to_string()))
        .await
        .unwrap();

    for bad in [0, 6] {
        let err = repos.books.set_rating(id, Some(bad)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidValue { field: "rating", .. }));
    }
    assert!(repos.books.set_rating(id, Some(4)).await.unwrap());
    assert_eq!(repos.books.get(id).await.unwrap().unwrap().rating, Some(4));
    assert!(repos.books.set_rating(id, None).await.unwrap());
    assert_eq!(repos.books.get(id).await.unwrap().unwrap().rating, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_journal_round_trip_and_filters() {
    let (_dir, _db, repos) = create_temp_repos();
    let mut entry = JournalEntry::new("Long walk by the river".to_string());
    entry.title = Some("Sunday".to_string());
    entry.mood = Some(Mood::Calm);
    entry.tags = vec!["outdoors".to_string(), "weekend".to_string()];
    entry.date = day(2024, 3, 10);
    let id = repos.journal.insert(&entry).await.unwrap();

    let mut plain = JournalEntry::new("Nothing much".to_string());
    plain.date = day(2024, 3, 12);
    repos.journal.insert(&plain).await.unwrap();

    let stored = repos.journal.get(id).await.unwrap().unwrap();
    assert_eq!(stored, JournalEntry { id: Some(id), ..entry });

    let all = next(&mut repos.journal.observe_all()).await;
    assert_eq!(all.iter().map(|e| e.content.as_str()).collect::<Vec<_>>(), vec![
        "Nothing much",
        "Long walk by the river"
    ]);
    assert_eq!(next(&mut repos.journal.observe_with_tag("weekend")).await.len(), 1);
    assert_eq!(next(&mut repos.journal.observe_by_mood(Mood::Calm)).await.len(), 1);
    assert_eq!(
        next(&mut repos.journal.observe_between(day(2024, 3, 11), day(2024, 3, 31)))
            .await
            .len(),
        1
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_journal_tags_keep_their_exact_text() {
    let (_dir, _db, repos) = create_temp_repos();
    let mut entry = JournalEntry::new("Planned the trip".to_string());
    entry.tags = vec![
        "travel".to_string(),
        "reading list".to_string(),
        "été".to_string(),
        "2024".to_string(),
    ];
    let id = repos.journal.insert(&entry).await.unwrap();

    let stored = repos.journal.get(id).await.unwrap().unwrap();
    assert_eq!(stored.tags, entry.tags);
    assert_eq!(next(&mut repos.journal.observe_with_tag("reading list")).await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_journal_tags_that_cannot_be_stored_are_rejected() {
    let (_dir, _db, repos) = create_temp_repos();

    for bad in ["a,b", " padded ", "trailing\t", ""] {
        let mut entry = JournalEntry::new("Tagged".to_string());
        entry.tags = vec!["fine".to_string(), bad.to_string()];
        let err = repos.journal.insert(&entry).await.unwrap_err();
        assert!(
            matches!(err, RepositoryError::InvalidValue { field: "tags", .. }),
            "expected tag rejection for {bad:?}, got {err}"
        );
    }
    assert!(next(&mut repos.journal.observe_all()).await.is_empty());

    let mut entry = JournalEntry::new("Tagged".to_string());
    entry.tags = vec!["fine".to_string()];
    let id = repos.journal.insert(&entry).await.unwrap();

    let mut edited = repos.journal.get(id).await.unwrap().unwrap();
    edited.tags.push("x,y".to_string());
    let err = repos.journal.update(&edited).await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidValue { field: "tags", .. }));
    assert_eq!(repos.journal.get(id).await.unwrap().unwrap().tags, vec!["fine"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_writing_entry_round_trip() {
    let (_dir, _db, repos) = create_temp_repos();
    let mut full = WritingEntry::new("Trip".to_string(), EntryType::Journal);
    full.content = "Packing list and photos".to_string();
    full.mood = Some(Mood::Excited);
    full.tags = vec!["travel".to_string()];
    full.attachments = vec![Attachment {
        kind: AttachmentType::Image,
        path: "/photos/beach.jpg".to_string(),
        name: "beach.jpg".to_string(),
        size: Some(2048),
    }];
    full.checklists = vec![
        ChecklistItem {
            text: "Passport".to_string(),
            is_completed: true,
        },
        ChecklistItem {
            text: "Charger".to_string(),
            is_completed: false,
        },
    ];
    let empty = WritingEntry::new("Blank".to_string(), EntryType::Note);

    for original in [full, empty] {
        let id = repos.writing.insert(&original).await.unwrap();
        let stored = repos.writing.get(id).await.unwrap().unwrap();
        assert_eq!(stored, WritingEntry { id: Some(id), ..original });
    }

    assert_eq!(next(&mut repos.writing.observe_by_type(EntryType::Note)).await.len(), 1);
    assert_eq!(next(&mut repos.writing.observe_with_tag("travel")).await.len(), 1);
    assert_eq!(next(&mut repos.writing.observe_search("Packing")).await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_seeding_is_idempotent() {
    let (_dir, _db, repos) = create_temp_repos();

    assert!(bootstrap::seed_sample_data(&repos).await.unwrap());
    assert!(!bootstrap::seed_sample_data(&repos).await.unwrap());
    assert_eq!(bootstrap::seed_default_categories(&repos.categories).await.unwrap(), 0);

    let categories = next(&mut repos.categories.observe_all()).await;
    assert_eq!(categories.len(), bootstrap::DEFAULT_CATEGORIES.len());
    assert!(categories.iter().all(|c| c.is_default));
    assert_eq!(repos.tasks.count().await.unwrap(), 1);

    // Defaults survive clearing custom categories
    assert_eq!(repos.categories.delete_custom().await.unwrap(), 0);
    assert!(repos.categories.has_defaults().await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reopening_keeps_data_and_schema_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("organizer.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::new(path).unwrap();
        Repositories::new(&db)
            .tasks
            .insert(&Task::new("persisted".to_string()))
            .await
            .unwrap();
    }

    let db = Database::new(path).unwrap();
    assert_eq!(db.schema_version().await.unwrap(), organizer::database::schema::SCHEMA_VERSION);
    assert_eq!(Repositories::new(&db).tasks.count().await.unwrap(), 1);
}

#[test]
fn test_observing_outside_a_runtime_reports_an_error() {
    let (_dir, _db, repos) = create_temp_repos();

    let mut tasks = repos.tasks.observe_all();
    assert!(!tasks.is_active());
    assert!(matches!(tasks.try_next(), Some(Err(RepositoryError::Database(DatabaseError::Worker(_))))));
    assert!(tasks.try_next().is_none());
}
