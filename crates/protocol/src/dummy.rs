//! Sample data for tests and the demo mode.
//!
//! [`dummy_tasks`] returns typed tasks spread over all four columns;
//! [`sample_collection`] returns the same tasks as the remote store would
//! serve them, plus one legacy record that still needs repair.
//!
//! # Examples
//!
//! ```
//! use join_protocol::dummy::{dummy_tasks, sample_collection};
//! use join_protocol::decode_collection;
//!
//! assert_eq!(dummy_tasks().len(), 6);
//!
//! let decoded = decode_collection(sample_collection()).unwrap();
//! assert_eq!(decoded.tasks.len(), 7);
//! assert!(decoded.rejected.is_empty());
//! ```

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value, json};

use crate::board::{MainCategory, TaskMap};
use crate::task::{Priority, Subtask, Task, TaskCategory, TaskId};

/// Key of the legacy record in [`sample_collection`].
pub const LEGACY_TASK_ID: &str = "-Nlegacy0";

struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    fn new(title: &str, category: TaskCategory) -> Self {
        let mut task = Task::new(title, category);
        task.created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single();
        Self { task }
    }

    fn description(mut self, description: &str) -> Self {
        self.task.description = description.to_string();
        self
    }

    fn column(mut self, category: MainCategory) -> Self {
        self.task.main_category = Some(category);
        self
    }

    fn priority(mut self, priority: Priority) -> Self {
        self.task.priority = priority;
        self
    }

    fn due(mut self, year: i32, month: u32, day: u32) -> Self {
        self.task.due_date = NaiveDate::from_ymd_opt(year, month, day);
        self
    }

    fn assign(mut self, names: &[&str]) -> Self {
        self.task.assigned_to = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    fn subtask(mut self, text: &str, completed: bool) -> Self {
        if let Ok(mut subtask) = Subtask::new(text) {
            subtask.completed = completed;
            self.task.subtasks.push(subtask);
        }
        self
    }

    fn build(self) -> Task {
        self.task
    }
}

/// Generates six tasks covering every column, priority, and category.
///
/// Keys are stable (`-Ndemo1` to `-Ndemo6`) so tests can address them.
#[must_use]
pub fn dummy_tasks() -> TaskMap {
    let tasks = [
        TaskBuilder::new("Kochwelt Page & Recipe Recommender", TaskCategory::UserStory)
            .description("Build start page with recipe recommendation")
            .column(MainCategory::InProgress)
            .priority(Priority::Medium)
            .due(2025, 5, 10)
            .assign(&["Emmanuel Mauer", "Marcel Bauer", "Anton Mayer"])
            .subtask("Implement Recipe Recommendation", true)
            .subtask("Start Page Layout", false)
            .build(),
        TaskBuilder::new("HTML Base Template Creation", TaskCategory::TechnicalTask)
            .description("Create reusable HTML base templates")
            .column(MainCategory::AwaitFeedback)
            .priority(Priority::Low)
            .due(2025, 6, 2)
            .assign(&["David Eisenberg", "Benedikt Ziegler"])
            .build(),
        TaskBuilder::new("Daily Kochwelt Recipe", TaskCategory::UserStory)
            .description("Implement daily recipe and portion calculator")
            .column(MainCategory::AwaitFeedback)
            .priority(Priority::Medium)
            .due(2025, 5, 20)
            .assign(&["Eva Fischer", "Anja Schulz", "Tatjana Wolf"])
            .build(),
        TaskBuilder::new("CSS Architecture Planning", TaskCategory::TechnicalTask)
            .description("Define CSS naming conventions and structure")
            .column(MainCategory::Done)
            .priority(Priority::Urgent)
            .due(2025, 4, 2)
            .assign(&["Sofia Müller", "Benedikt Ziegler"])
            .subtask("Establish CSS Methodology", true)
            .subtask("Setup Base Styles", true)
            .build(),
        TaskBuilder::new("Contact Form & Imprint", TaskCategory::UserStory)
            .description("Create a contact form and imprint page")
            .column(MainCategory::ToDo)
            .priority(Priority::Urgent)
            .due(2025, 4, 14)
            .assign(&["Anton Mayer"])
            .subtask("Create contact form", false)
            .subtask("Set up imprint page", false)
            .subtask("Link imprint in footer", false)
            .build(),
        TaskBuilder::new("Login Validation", TaskCategory::TechnicalTask)
            .column(MainCategory::ToDo)
            .build(),
    ];

    tasks
        .into_iter()
        .enumerate()
        .map(|(i, task)| (TaskId::new(format!("-Ndemo{}", i + 1)), task))
        .collect()
}

/// Returns the demo tasks as the JSON object the store serves at the task
/// collection path.
///
/// Besides the tasks of [`dummy_tasks`], the collection holds one legacy
/// record under [`LEGACY_TASK_ID`]: lowercase priority, empty due date, no
/// column, and subtasks without ids.
#[must_use]
pub fn sample_collection() -> Value {
    let mut collection: Map<String, Value> = dummy_tasks()
        .into_iter()
        .filter_map(|(id, task)| Some((id.to_string(), task.to_value().ok()?)))
        .collect();

    collection.insert(
        LEGACY_TASK_ID.to_string(),
        json!({
            "title": "Dashboard Greeting",
            "description": "Greet the user by daytime",
            "dueDate": "",
            "priority": "low",
            "category": "User Story",
            "assignedTo": ["Marcel Bauer"],
            "subtasks": [
                { "text": "Morning text", "completed": true },
                null,
                { "text": "Evening text", "completed": false }
            ]
        }),
    );

    Value::Object(collection)
}
