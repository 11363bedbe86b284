//! Derived subtask progress.
//!
//! Progress is never stored; it is recomputed from the current subtask
//! sequence whenever a card is drawn.

use std::fmt;

use crate::task::Subtask;

/// Completed versus total subtasks of one task.
///
/// # Examples
///
/// ```
/// use join_protocol::Progress;
///
/// let progress = Progress { completed: 2, total: 5 };
/// assert_eq!(progress.percent(), 40);
/// assert_eq!(progress.to_string(), "2/5 Subtasks");
///
/// let none = Progress { completed: 0, total: 0 };
/// assert_eq!(none.percent(), 0);
/// assert_eq!(none.to_string(), "no subtasks");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Progress {
    /// Number of checked-off subtasks.
    pub completed: usize,
    /// Number of subtasks.
    pub total: usize,
}

impl Progress {
    /// Counts the subtasks of a task.
    #[must_use]
    pub fn of(subtasks: &[Subtask]) -> Self {
        Self {
            completed: subtasks.iter().filter(|s| s.completed).count(),
            total: subtasks.len(),
        }
    }

    /// Returns `true` if the task has no subtasks.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.total == 0
    }

    /// Completion in whole percent, rounded down. Zero without subtasks.
    #[must_use]
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        u8::try_from(100 * self.completed.min(self.total) / self.total).unwrap_or(100)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("no subtasks")
        } else {
            write!(f, "{}/{} Subtasks", self.completed, self.total)
        }
    }
}
