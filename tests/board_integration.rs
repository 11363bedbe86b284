//! End-to-end board behavior against an in-memory store.

use std::sync::Arc;

use join_board::{
    Board, BoardError, DragDropController, DropOutcome, Outcome, SkipReason, SubtaskEditor,
    SubtaskOutcome, TaskRepository,
};
use join_protocol::{Intent, MainCategory, Progress, Subtask, SubtaskKey, TaskId};
use join_store::{MemoryStore, Method, RemoteStore};
use serde_json::{Value, json};

fn store_with(tasks: Value) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_root(json!({ "tasks": tasks })))
}

fn record(title: &str) -> Value {
    json!({ "title": title, "category": "User Story", "mainCategory": "ToDo" })
}

async fn loaded(store: &Arc<MemoryStore>) -> TaskRepository {
    let repo = TaskRepository::new(store.clone(), "tasks");
    repo.load_all().await.unwrap();
    store.clear_requests();
    repo
}

#[tokio::test]
async fn missing_column_is_repaired_once_per_task() {
    let store = store_with(json!({
        "-Na": { "title": "A", "category": "User Story" },
        "-Nb": { "title": "B", "category": "Technical Task" },
        "-Nc": record("C"),
    }));
    let repo = loaded(&store).await;

    let report = repo.repair().await;
    assert_eq!(report.repaired, 2);
    assert_eq!(store.count(Method::Patch), 2);
    for id in ["-Na", "-Nb"] {
        assert_eq!(store.value_at(&format!("tasks/{id}/mainCategory")), json!("ToDo"));
    }

    repo.load_all().await.unwrap();
    repo.repair().await;
    assert_eq!(store.count(Method::Patch), 2);
}

#[tokio::test]
async fn status_change_survives_reload() {
    let store = store_with(json!({ "-Na": record("A") }));
    let repo = loaded(&store).await;
    let id = TaskId::new("-Na");

    repo.set_status(&id, MainCategory::Done).await.unwrap();

    let fresh = TaskRepository::new(store.clone(), "tasks");
    fresh.load_all().await.unwrap();
    assert_eq!(
        fresh.task(&id).await.unwrap().main_category,
        Some(MainCategory::Done)
    );
}

#[tokio::test]
async fn appended_subtask_is_trimmed_and_open() {
    let store = store_with(json!({ "-Na": record("A") }));
    let editor = SubtaskEditor::new(loaded(&store).await);

    editor.append(&TaskId::new("-Na"), "  wash dishes  ").await.unwrap();

    let stored = store.value_at("tasks/-Na/subtasks/0");
    assert_eq!(stored["text"], "wash dishes");
    assert_eq!(stored["completed"], false);
}

#[tokio::test]
async fn blank_subtask_is_ignored() {
    let store = store_with(json!({ "-Na": record("A") }));
    let repo = loaded(&store).await;
    let editor = SubtaskEditor::new(repo.clone());

    let outcome = editor.append(&TaskId::new("-Na"), "   ").await.unwrap();

    assert_eq!(outcome, SubtaskOutcome::Skipped(SkipReason::EmptyText));
    assert!(repo.task(&TaskId::new("-Na")).await.unwrap().subtasks.is_empty());
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn toggle_applies_to_concurrently_extended_subtasks() {
    let store = store_with(json!({ "-Na": {
        "title": "A",
        "category": "User Story",
        "mainCategory": "ToDo",
        "subtasks": [{ "text": "one" }],
    }}));
    let repo = loaded(&store).await;
    let editor = SubtaskEditor::new(repo.clone());

    // Another client appends a subtask after our load.
    store
        .patch(
            "tasks/-Na",
            &json!({ "subtasks": [{ "text": "one" }, { "text": "two" }] }),
        )
        .await
        .unwrap();

    editor
        .toggle_completed(&TaskId::new("-Na"), SubtaskKey::Index(1))
        .await
        .unwrap();

    assert_eq!(
        store.value_at("tasks/-Na/subtasks"),
        json!([
            { "text": "one", "completed": false },
            { "text": "two", "completed": true }
        ])
    );
    let local = repo.task(&TaskId::new("-Na")).await.unwrap();
    assert_eq!(local.progress(), Progress { completed: 1, total: 2 });
}

#[test]
fn progress_labels() {
    assert_eq!(Progress::of(&[]).to_string(), "no subtasks");
    assert_eq!(Progress::of(&[]).percent(), 0);

    let mut subtasks: Vec<Subtask> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|t| Subtask::new(t).unwrap())
        .collect();
    subtasks[0].completed = true;
    subtasks[3].completed = true;

    let progress = Progress::of(&subtasks);
    assert_eq!(progress.percent(), 40);
    assert_eq!(progress.to_string(), "2/5 Subtasks");
}

#[tokio::test]
async fn removal_shifts_indices_but_not_ids() {
    let store = store_with(json!({ "-Na": record("A") }));
    let repo = loaded(&store).await;
    let editor = SubtaskEditor::new(repo.clone());
    let id = TaskId::new("-Na");

    let mut handles = Vec::new();
    for text in ["a", "b", "c"] {
        handles.push(editor.append(&id, text).await.unwrap().applied().unwrap());
    }
    let c = handles[2].key();

    editor.remove(&id, SubtaskKey::Index(1)).await.unwrap();

    let subtasks = repo.task(&id).await.unwrap().subtasks;
    let texts: Vec<&str> = subtasks.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["a", "c"]);
    assert_eq!(c.resolve(&subtasks), Some(1));
    assert_eq!(store.value_at("tasks/-Na/subtasks/1/text"), json!("c"));
}

#[tokio::test]
async fn drop_on_unregistered_column_persists_nothing() {
    let store = store_with(json!({ "-Na": record("A") }));
    let repo = loaded(&store).await;
    let dnd = DragDropController::new(repo.clone());

    dnd.start_drag(TaskId::new("-Na"));
    let outcome = dnd.drop_on("Backlog").await;

    assert_eq!(outcome, DropOutcome::UnknownZone("Backlog".to_string()));
    assert!(store.requests().is_empty());
    assert_eq!(
        repo.task(&TaskId::new("-Na")).await.unwrap().main_category,
        Some(MainCategory::ToDo)
    );
}

#[tokio::test]
async fn failed_delete_keeps_task_everywhere() {
    let store = store_with(json!({ "-Na": record("A") }));
    let repo = loaded(&store).await;
    store.fail(Method::Delete);

    let err = repo.delete_one(&TaskId::new("-Na")).await.unwrap_err();

    assert!(matches!(err, BoardError::Store(_)));
    assert!(repo.task(&TaskId::new("-Na")).await.is_some());
    assert_eq!(store.value_at("tasks/-Na/title"), json!("A"));
}

#[tokio::test]
async fn overlapping_toggles_end_with_the_last_completed_write() {
    let store = store_with(json!({ "-Na": {
        "title": "A",
        "category": "User Story",
        "mainCategory": "ToDo",
        "subtasks": [{ "text": "a" }, { "text": "b" }],
    }}));
    let repo = loaded(&store).await;
    let editor = SubtaskEditor::new(repo.clone());
    let id = TaskId::new("-Na");
    store.hold(Method::Patch);

    let toggle = |index: usize| {
        let editor = editor.clone();
        let id = id.clone();
        tokio::spawn(async move { editor.toggle_completed(&id, SubtaskKey::Index(index)).await })
    };
    let first = toggle(0);
    store.until_held(1).await;
    let second = toggle(1);
    store.until_held(2).await;

    // Both read the stored array before either write landed.
    assert_eq!(store.count(Method::Get), 2);
    assert_eq!(store.count(Method::Patch), 0);

    let second_write = store.release(1).unwrap();
    second.await.unwrap().unwrap();
    let first_write = store.release(0).unwrap();
    first.await.unwrap().unwrap();

    assert_eq!(
        second_write.body.unwrap()["subtasks"],
        json!([
            { "text": "a", "completed": false },
            { "text": "b", "completed": true }
        ])
    );
    let last = first_write.body.unwrap()["subtasks"].clone();
    assert_eq!(
        last,
        json!([
            { "text": "a", "completed": true },
            { "text": "b", "completed": false }
        ])
    );
    assert_eq!(store.value_at("tasks/-Na/subtasks"), last);

    let local = repo.task(&id).await.unwrap();
    assert_eq!(local.progress(), Progress { completed: 1, total: 2 });
    assert!(local.subtasks[0].completed);
    assert!(!local.subtasks[1].completed);
}

#[tokio::test]
async fn blank_stored_subtasks_do_not_block_edits() {
    let store = store_with(json!({ "-Na": {
        "title": "A",
        "category": "User Story",
        "mainCategory": "ToDo",
        "subtasks": [{ "text": "" }, { "text": "real" }],
    }}));
    let repo = loaded(&store).await;
    let editor = SubtaskEditor::new(repo.clone());
    let id = TaskId::new("-Na");

    assert_eq!(repo.task(&id).await.unwrap().subtasks.len(), 1);

    editor.toggle_completed(&id, SubtaskKey::Index(0)).await.unwrap();
    assert_eq!(
        store.value_at("tasks/-Na/subtasks"),
        json!([{ "text": "real", "completed": true }])
    );

    editor.append(&id, "new").await.unwrap();
    let stored = store.value_at("tasks/-Na/subtasks");
    assert_eq!(stored.as_array().map(Vec::len), Some(2));
    assert_eq!(stored[1]["text"], "new");
    assert_eq!(repo.task(&id).await.unwrap().subtasks.len(), 2);
}

#[tokio::test]
async fn board_session_from_load_to_done() {
    let store = store_with(json!({
        "-Na": { "title": "Ship it", "category": "Technical Task" },
    }));
    let board = Board::new(TaskRepository::new(store.clone(), "tasks"));
    let mut rx = board.subscribe();
    let id = TaskId::new("-Na");

    board.dispatch(Intent::Load).await.unwrap();
    assert_eq!(rx.borrow_and_update().total_cards(), 0);

    board.dispatch(Intent::Repair).await.unwrap();
    assert_eq!(
        rx.borrow_and_update().find_card(&id).map(|(c, _)| c),
        Some(MainCategory::ToDo)
    );

    board
        .dispatch(Intent::AddSubtask {
            id: id.clone(),
            text: "write changelog".to_string(),
        })
        .await
        .unwrap();
    board
        .dispatch(Intent::ToggleSubtask {
            id: id.clone(),
            key: SubtaskKey::Index(0),
        })
        .await
        .unwrap();
    board.dispatch(Intent::DragStart { id: id.clone() }).await.unwrap();
    let dropped = board
        .dispatch(Intent::Drop {
            zone: "Done".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(dropped, Outcome::Dropped(DropOutcome::Moved { .. })));

    let view = rx.borrow_and_update().clone();
    let (column, card) = view.find_card(&id).unwrap();
    assert_eq!(column, MainCategory::Done);
    assert_eq!(card.progress.to_string(), "1/1 Subtasks");

    let stored = store.value_at("tasks/-Na");
    assert_eq!(stored["mainCategory"], "Done");
    assert_eq!(stored["subtasks"][0]["completed"], true);
}
