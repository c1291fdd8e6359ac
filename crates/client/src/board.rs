//! In-memory task list
//!
//! Holds the tasks most recently fetched from the API and applies the
//! client-side views the API does not offer: completion filters and
//! sorting.

use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::str::FromStr;

use crate::types::Task;

/// Completion filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    All,
    Completed,
    Pending,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        })
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" | "done" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// Sort order for the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Earliest deadline first, tasks without a deadline last
    Deadline,
    /// Highest priority first
    Priority,
    /// Case-insensitive title
    Title,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deadline => "deadline",
            Self::Priority => "priority",
            Self::Title => "title",
        })
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deadline" => Ok(Self::Deadline),
            "priority" => Ok(Self::Priority),
            "title" => Ok(Self::Title),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl SortKey {
    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::Deadline => match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Priority => Reverse(a.priority).cmp(&Reverse(b.priority)),
            Self::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        }
    }
}

/// Ordered task list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    tasks: Vec<Task>,
}

impl Board {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Tasks passing `filter`, in list order
    pub fn visible(&self, filter: Filter) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    /// Stable sort; equal tasks keep their relative order
    pub fn sort_by(&mut self, key: SortKey) {
        self.tasks.sort_by(|a, b| key.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, Tag};
    use chrono::NaiveDate;

    fn task(id: u64, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            completed: false,
            deadline: None,
            priority: Priority::Medium,
            tag: Tag::Personal,
        }
    }

    fn ids(board: &Board) -> Vec<u64> {
        board.visible(Filter::All).map(|t| t.id).collect()
    }

    #[test]
    fn filters_by_completion() {
        let mut done = task(2, "b");
        done.completed = true;
        let board = Board::new(vec![task(1, "a"), done, task(3, "c")]);

        let pending: Vec<u64> = board.visible(Filter::Pending).map(|t| t.id).collect();
        let completed: Vec<u64> = board.visible(Filter::Completed).map(|t| t.id).collect();
        assert_eq!(pending, vec![1, 3]);
        assert_eq!(completed, vec![2]);
        assert_eq!(board.visible(Filter::All).count(), 3);
    }

    #[test]
    fn filter_parses_and_displays() {
        assert_eq!("Pending".parse::<Filter>(), Ok(Filter::Pending));
        assert_eq!(Filter::Completed.to_string(), "completed");
        assert!("someday".parse::<Filter>().is_err());
    }

    #[test]
    fn deadline_sort_puts_undated_last() {
        let mut a = task(1, "a");
        a.deadline = NaiveDate::from_ymd_opt(2025, 5, 1);
        let mut c = task(3, "c");
        c.deadline = NaiveDate::from_ymd_opt(2025, 1, 1);
        let mut board = Board::new(vec![a, task(2, "b"), c]);

        board.sort_by(SortKey::Deadline);
        assert_eq!(ids(&board), vec![3, 1, 2]);
    }

    #[test]
    fn priority_sort_is_high_first_and_stable() {
        let mut high = task(2, "b");
        high.priority = Priority::High;
        let mut low = task(4, "d");
        low.priority = Priority::Low;
        let mut board = Board::new(vec![task(1, "a"), high, low, task(3, "c")]);

        board.sort_by(SortKey::Priority);
        assert_eq!(ids(&board), vec![2, 1, 3, 4]);
    }

    #[test]
    fn title_sort_ignores_case() {
        let mut board = Board::new(vec![task(1, "beta"), task(2, "Alpha"), task(3, "gamma")]);
        board.sort_by(SortKey::Title);
        assert_eq!(ids(&board), vec![2, 1, 3]);
    }
}
