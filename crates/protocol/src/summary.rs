//! Board summary counters.
//!
//! Mirrors the dashboard figures: how many tasks sit in each column, how
//! many are on the board in total, and which urgent deadline comes next.

use chrono::NaiveDate;

use crate::board::MainCategory;
use crate::task::{Priority, Task};

/// The nearest urgent deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrgentSummary {
    /// Number of urgent tasks due on [`next_due`](Self::next_due).
    pub count: usize,
    /// The earliest due date among urgent tasks.
    pub next_due: Option<NaiveDate>,
}

/// Aggregate figures over all tasks.
///
/// # Examples
///
/// ```
/// use join_protocol::{BoardSummary, MainCategory, Priority, Task, TaskCategory};
///
/// let mut urgent = Task::new("Hotfix", TaskCategory::TechnicalTask);
/// urgent.priority = Priority::Urgent;
/// urgent.due_date = chrono::NaiveDate::from_ymd_opt(2025, 7, 1);
/// let normal = Task::new("Docs", TaskCategory::TechnicalTask);
///
/// let summary = BoardSummary::from_tasks([&urgent, &normal]);
/// assert_eq!(summary.count(MainCategory::ToDo), 2);
/// assert_eq!(summary.total(), 2);
/// assert_eq!(summary.urgent.count, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardSummary {
    /// Task counts indexed by [`MainCategory::index`].
    pub counts: [usize; 4],
    /// The nearest urgent deadline.
    pub urgent: UrgentSummary,
}

impl BoardSummary {
    /// Computes the summary over the given tasks.
    ///
    /// Tasks without a column are not counted. Urgent tasks count toward the
    /// deadline regardless of their column; urgent tasks without a due date
    /// are ignored.
    #[must_use]
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut summary = Self::default();
        let mut urgent_dates = Vec::new();

        for task in tasks {
            if let Some(category) = task.main_category {
                summary.counts[category.index()] += 1;
            }
            if task.priority == Priority::Urgent {
                urgent_dates.extend(task.due_date);
            }
        }

        if let Some(next) = urgent_dates.iter().min().copied() {
            summary.urgent = UrgentSummary {
                count: urgent_dates.iter().filter(|d| **d == next).count(),
                next_due: Some(next),
            };
        }
        summary
    }

    /// Returns the number of tasks in a column.
    #[must_use]
    pub fn count(&self, category: MainCategory) -> usize {
        self.counts[category.index()]
    }

    /// Returns the number of tasks on the board.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}
