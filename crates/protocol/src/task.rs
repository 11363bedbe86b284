//! Task-related types for the board.
//!
//! This module defines the task record as it is stored in the remote
//! database, its subtasks, and the partial-update payload used when only
//! some fields change.
//!
//! Field names on the wire are camelCase (`dueDate`, `mainCategory`,
//! `assignedTo`, `createdAt`) to stay readable by existing clients of the
//! same database.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::board::MainCategory;
use crate::error::{ProtocolError, Result};
use crate::progress::Progress;
use crate::wire;

/// Identifier of a task, assigned by the remote store on creation.
///
/// This is the key of the record inside the task collection, never a field
/// of the record itself.
///
/// # Examples
///
/// ```
/// use join_protocol::TaskId;
///
/// let id = TaskId::new("-NxA1b2c3");
/// assert_eq!(id.as_str(), "-NxA1b2c3");
/// assert_eq!(id.to_string(), "-NxA1b2c3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a store key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the store key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Stable identifier of a subtask.
pub type SubtaskId = uuid::Uuid;

/// How urgent a task is.
///
/// Parsing is case-insensitive because stored records contain both
/// `"Medium"` and `"medium"`; serialization always writes the capitalized
/// form. A stored `""` or `null` reads as the default.
///
/// # Examples
///
/// ```
/// use join_protocol::Priority;
///
/// let prio: Priority = "urgent".parse().unwrap();
/// assert_eq!(prio, Priority::Urgent);
/// assert_eq!(Priority::default(), Priority::Medium);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Priority {
    /// Needs to be done first.
    Urgent,
    /// The default priority.
    #[default]
    Medium,
    /// Can wait.
    Low,
}

impl Priority {
    /// Returns the capitalized wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Urgent, Self::Medium, Self::Low]
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::UnknownPriority(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => raw.parse().map_err(serde::de::Error::custom),
            _ => Ok(Self::default()),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskCategory {
    /// A user-facing feature.
    #[serde(rename = "User Story")]
    UserStory,
    /// Internal engineering work.
    #[serde(rename = "Technical Task")]
    TechnicalTask,
}

impl TaskCategory {
    /// Returns the wire and display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::UserStory => "User Story",
            Self::TechnicalTask => "Technical Task",
        }
    }
}

/// A checklist item inside a task.
///
/// Subtasks written by older clients have no `id`; those are assigned one
/// during the startup repair pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Stable identifier, absent on legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SubtaskId>,
    /// What needs to be done. Never empty after trimming.
    pub text: String,
    /// Whether the item is checked off.
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    /// Creates an open subtask with a fresh id from untrimmed input.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::EmptySubtaskText`] if `text` is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_protocol::Subtask;
    ///
    /// let subtask = Subtask::new("  wash dishes  ").unwrap();
    /// assert_eq!(subtask.text, "wash dishes");
    /// assert!(!subtask.completed);
    /// assert!(subtask.id.is_some());
    ///
    /// assert!(Subtask::new("   ").is_err());
    /// ```
    pub fn new(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ProtocolError::EmptySubtaskText);
        }
        Ok(Self {
            id: Some(SubtaskId::new_v4()),
            text: text.to_string(),
            completed: false,
        })
    }

    /// Assigns a fresh id if the subtask has none.
    ///
    /// Returns `true` if an id was assigned.
    pub fn ensure_id(&mut self) -> bool {
        if self.id.is_some() {
            return false;
        }
        self.id = Some(SubtaskId::new_v4());
        true
    }
}

/// Addresses a subtask inside its parent task.
///
/// Positions shift when earlier subtasks are removed; ids do not. UI code
/// that keeps a reference across mutations should hold an id and translate
/// it with [`SubtaskKey::resolve`] when rendering.
///
/// # Examples
///
/// ```
/// use join_protocol::{Subtask, SubtaskKey};
///
/// let subtasks = vec![Subtask::new("a").unwrap(), Subtask::new("b").unwrap()];
/// let b = subtasks[1].id.unwrap();
///
/// assert_eq!(SubtaskKey::from(1).resolve(&subtasks), Some(1));
/// assert_eq!(SubtaskKey::from(b).resolve(&subtasks[1..]), Some(0));
/// assert_eq!(SubtaskKey::from(5).resolve(&subtasks), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskKey {
    /// Current position in the subtask sequence.
    Index(usize),
    /// Stable identifier.
    Id(SubtaskId),
}

impl SubtaskKey {
    /// Returns the current position of the addressed subtask, if present.
    #[must_use]
    pub fn resolve(self, subtasks: &[Subtask]) -> Option<usize> {
        match self {
            Self::Index(index) => (index < subtasks.len()).then_some(index),
            Self::Id(id) => subtasks.iter().position(|s| s.id == Some(id)),
        }
    }
}

impl From<usize> for SubtaskKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<SubtaskId> for SubtaskKey {
    fn from(id: SubtaskId) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for SubtaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// A task on the board, as stored in the remote database.
///
/// # Examples
///
/// ```
/// use join_protocol::{MainCategory, Priority, Task, TaskCategory};
///
/// let task = Task::new("Implement login", TaskCategory::UserStory);
/// assert_eq!(task.main_category, Some(MainCategory::ToDo));
/// assert_eq!(task.priority, Priority::Medium);
/// assert!(task.subtasks.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Short summary of the task.
    pub title: String,
    /// Longer explanation, may be empty.
    #[serde(default)]
    pub description: String,
    /// When the task is due.
    #[serde(
        default,
        with = "wire::optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    /// How urgent the task is.
    #[serde(default)]
    pub priority: Priority,
    /// The kind of work.
    pub category: TaskCategory,
    /// The board column; `None` only on legacy records awaiting repair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_category: Option<MainCategory>,
    /// Full names of assigned contacts, in selection order.
    #[serde(default)]
    pub assigned_to: Vec<String>,
    /// Checklist items, in display order.
    #[serde(default, deserialize_with = "wire::subtask_seq")]
    pub subtasks: Vec<Subtask>,
    /// When the task was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new task in the `ToDo` column with default priority.
    ///
    /// The creation timestamp is set to the current time.
    #[must_use]
    pub fn new(title: impl Into<String>, category: TaskCategory) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: Priority::default(),
            category,
            main_category: Some(MainCategory::ToDo),
            assigned_to: Vec::new(),
            subtasks: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Decodes a stored record.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidRecord`] if the value does not
    /// describe a task.
    pub fn from_value(id: &TaskId, value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|source| ProtocolError::InvalidRecord {
            id: id.to_string(),
            source,
        })
    }

    /// Encodes the task as a stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(ProtocolError::SerializationFailed)
    }

    /// Checks the invariants a task must satisfy before it is written.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidTaskTitle`] for a blank title and
    /// [`ProtocolError::EmptySubtaskText`] for a blank subtask.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ProtocolError::InvalidTaskTitle);
        }
        if self.subtasks.iter().any(|s| s.text.trim().is_empty()) {
            return Err(ProtocolError::EmptySubtaskText);
        }
        Ok(())
    }

    /// Returns the derived subtask progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::of(&self.subtasks)
    }

    /// Assigns ids to subtasks that lack one.
    ///
    /// Returns `true` if any subtask changed.
    pub fn ensure_subtask_ids(&mut self) -> bool {
        self.subtasks
            .iter_mut()
            .fold(false, |changed, s| s.ensure_id() | changed)
    }

    /// Returns `true` if the title or description contains `query`,
    /// ignoring case. An empty query matches every task.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_protocol::{Task, TaskCategory};
    ///
    /// let mut task = Task::new("Fix Login", TaskCategory::TechnicalTask);
    /// task.description = "Button broken on mobile".to_string();
    ///
    /// assert!(task.matches_search("login"));
    /// assert!(task.matches_search("MOBILE"));
    /// assert!(!task.matches_search("desktop"));
    /// ```
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }

    /// Overwrites the fields named in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(main_category) = patch.main_category {
            self.main_category = Some(main_category);
        }
        if let Some(assigned_to) = &patch.assigned_to {
            self.assigned_to.clone_from(assigned_to);
        }
        if let Some(subtasks) = &patch.subtasks {
            self.subtasks.clone_from(subtasks);
        }
    }
}

/// A partial update: only the fields that are `Some` are sent and written.
///
/// # Examples
///
/// ```
/// use join_protocol::{MainCategory, TaskPatch};
///
/// let patch = TaskPatch::main_category(MainCategory::Done);
/// let json = serde_json::to_string(&patch).unwrap();
/// assert_eq!(json, r#"{"mainCategory":"Done"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New due date.
    #[serde(
        default,
        with = "wire::optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    /// New board column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_category: Option<MainCategory>,
    /// New assignee list, replacing the old one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<String>>,
    /// New subtask list, replacing the old one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
}

impl TaskPatch {
    /// A patch that only moves the task to another column.
    #[must_use]
    pub fn main_category(category: MainCategory) -> Self {
        Self {
            main_category: Some(category),
            ..Self::default()
        }
    }

    /// A patch that only replaces the subtask list.
    #[must_use]
    pub fn subtasks(subtasks: Vec<Subtask>) -> Self {
        Self {
            subtasks: Some(subtasks),
            ..Self::default()
        }
    }

    /// Returns `true` if the patch names no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks that the named fields keep the task valid.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidTaskTitle`] for a blank title and
    /// [`ProtocolError::EmptySubtaskText`] for a blank subtask.
    pub fn validate(&self) -> Result<()> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ProtocolError::InvalidTaskTitle);
        }
        if self
            .subtasks
            .iter()
            .flatten()
            .any(|s| s.text.trim().is_empty())
        {
            return Err(ProtocolError::EmptySubtaskText);
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    impl Arbitrary for Priority {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            prop_oneof![Just(Priority::Urgent), Just(Priority::Medium), Just(Priority::Low)].boxed()
        }
    }

    impl Arbitrary for MainCategory {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            prop_oneof![
                Just(MainCategory::ToDo),
                Just(MainCategory::InProgress),
                Just(MainCategory::AwaitFeedback),
                Just(MainCategory::Done),
            ]
            .boxed()
        }
    }

    prop_compose! {
        fn arb_task()(
            title in "[a-zA-Z][a-zA-Z0-9 ]{0,40}",
            description in "[a-zA-Z0-9 .,!?]{0,120}",
            priority in any::<Priority>(),
            main_category in proptest::option::of(any::<MainCategory>()),
            subtasks in proptest::collection::vec(("[a-z][a-z ]{0,20}", any::<bool>()), 0..6),
            day in 1u32..28,
        ) -> Task {
            let mut task = Task::new(title, TaskCategory::UserStory);
            task.description = description;
            task.priority = priority;
            task.main_category = main_category;
            task.due_date = NaiveDate::from_ymd_opt(2025, 6, day);
            task.subtasks = subtasks
                .into_iter()
                .map(|(text, completed)| {
                    let mut s = Subtask::new(&text).expect("non-empty text");
                    s.completed = completed;
                    s
                })
                .collect();
            task
        }
    }

    proptest! {
        /// Priority parsing ignores case.
        #[test]
        fn priority_parse_is_case_insensitive(priority in any::<Priority>(), upper in any::<bool>()) {
            let raw = if upper {
                priority.as_str().to_uppercase()
            } else {
                priority.as_str().to_lowercase()
            };
            prop_assert_eq!(raw.parse::<Priority>().unwrap(), priority);
        }

        /// A stored task decodes back to the same task.
        #[test]
        fn stored_task_decodes_unchanged(task in arb_task()) {
            let id = TaskId::new("-Nprop");
            let value = task.to_value().expect("encode");
            let decoded = Task::from_value(&id, value).expect("decode");
            prop_assert_eq!(task, decoded);
        }

        /// Applying an empty patch changes nothing.
        #[test]
        fn empty_patch_is_identity(task in arb_task()) {
            let mut patched = task.clone();
            patched.apply(&TaskPatch::default());
            prop_assert_eq!(task, patched);
        }
    }
}
