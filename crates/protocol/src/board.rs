//! Board columns and the board read model.
//!
//! This module defines the four fixed columns a task can occupy and the
//! [`BoardView`] snapshot that renderers consume. Renderers never see or
//! mutate the task mapping itself.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::contacts::{Assignee, ContactDirectory};
use crate::error::{ProtocolError, Result};
use crate::progress::Progress;
use crate::task::{Priority, Task, TaskCategory, TaskId};

/// The in-memory task mapping, keyed by store id.
///
/// Store ids are push keys that sort chronologically, so iteration order is
/// creation order.
pub type TaskMap = BTreeMap<TaskId, Task>;

/// The board column a task occupies.
///
/// The order reflects the typical progression of work.
///
/// # Examples
///
/// ```
/// use join_protocol::MainCategory;
///
/// let column: MainCategory = "AwaitFeedback".parse().unwrap();
/// assert_eq!(column.display_name(), "Await Feedback");
/// assert_eq!(column.as_str(), "AwaitFeedback");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MainCategory {
    /// Tasks waiting to be started.
    #[default]
    ToDo,
    /// Tasks currently being worked on.
    InProgress,
    /// Tasks waiting for someone else's input.
    AwaitFeedback,
    /// Completed tasks.
    Done,
}

impl MainCategory {
    /// Returns all columns in workflow order.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_protocol::MainCategory;
    ///
    /// let columns = MainCategory::all();
    /// assert_eq!(columns.len(), 4);
    /// assert_eq!(columns[0], MainCategory::ToDo);
    /// ```
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::ToDo, Self::InProgress, Self::AwaitFeedback, Self::Done]
    }

    /// Returns the name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToDo => "ToDo",
            Self::InProgress => "InProgress",
            Self::AwaitFeedback => "AwaitFeedback",
            Self::Done => "Done",
        }
    }

    /// Returns a human-readable display name for the column.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::AwaitFeedback => "Await Feedback",
            Self::Done => "Done",
        }
    }

    /// Returns the index of this column on the board (0-3).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::ToDo => 0,
            Self::InProgress => 1,
            Self::AwaitFeedback => 2,
            Self::Done => 3,
        }
    }
}

impl FromStr for MainCategory {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownMainCategory(s.to_string()))
    }
}

impl fmt::Display for MainCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What a renderer needs to draw one task card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// The task this card shows.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Kind of work, shown as a badge.
    pub category: TaskCategory,
    /// Priority icon.
    pub priority: Priority,
    /// Due date, if any.
    pub due_date: Option<NaiveDate>,
    /// Subtask progress bar.
    pub progress: Progress,
    /// Assigned contacts with their avatar data.
    pub assignees: Vec<Assignee>,
}

impl Card {
    fn from_task(id: &TaskId, task: &Task, contacts: &dyn ContactDirectory) -> Self {
        Self {
            id: id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category,
            priority: task.priority,
            due_date: task.due_date,
            progress: task.progress(),
            assignees: task
                .assigned_to
                .iter()
                .map(|name| Assignee::new(name, contacts))
                .collect(),
        }
    }
}

/// One column of the board read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Which column this is.
    pub category: MainCategory,
    /// Cards in creation order.
    pub cards: Vec<Card>,
}

/// A read-only snapshot of the board, grouped by column.
///
/// Tasks without a column are left out until they are repaired. When a
/// search query is set, only matching tasks appear.
///
/// # Examples
///
/// ```
/// use join_protocol::{BoardView, MainCategory, NoContacts, Task, TaskCategory, TaskId, TaskMap};
///
/// let mut tasks = TaskMap::new();
/// tasks.insert(TaskId::new("-Na"), Task::new("Write docs", TaskCategory::TechnicalTask));
///
/// let view = BoardView::build(&tasks, "", &NoContacts);
/// assert_eq!(view.column(MainCategory::ToDo).cards.len(), 1);
/// assert_eq!(view.total_cards(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// The four columns, indexed by [`MainCategory::index`].
    pub columns: [Column; 4],
    /// The search query the view was filtered with; empty for none.
    pub query: String,
}

impl Default for BoardView {
    fn default() -> Self {
        Self {
            columns: MainCategory::all().map(|category| Column {
                category,
                cards: Vec::new(),
            }),
            query: String::new(),
        }
    }
}

impl BoardView {
    /// Builds the view from the task mapping.
    #[must_use]
    pub fn build(tasks: &TaskMap, query: &str, contacts: &dyn ContactDirectory) -> Self {
        let mut view = Self {
            query: query.to_string(),
            ..Self::default()
        };
        let query = query.trim();
        for (id, task) in tasks {
            let Some(category) = task.main_category else {
                continue;
            };
            if !query.is_empty() && !task.matches_search(query) {
                continue;
            }
            view.columns[category.index()]
                .cards
                .push(Card::from_task(id, task, contacts));
        }
        view
    }

    /// Returns the column of the given kind.
    #[must_use]
    pub fn column(&self, category: MainCategory) -> &Column {
        &self.columns[category.index()]
    }

    /// Returns the total number of cards across all columns.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Finds a card and the column it sits in.
    #[must_use]
    pub fn find_card(&self, id: &TaskId) -> Option<(MainCategory, &Card)> {
        self.columns.iter().find_map(|column| {
            column
                .cards
                .iter()
                .find(|card| &card.id == id)
                .map(|card| (column.category, card))
        })
    }
}
