//! Ordered task collection with a derived display order.
//!
//! `TaskStore` owns every task the user has created. Tasks keep their
//! insertion position for the lifetime of the store; completion order is
//! tracked separately so the view can list finished tasks in the order they
//! were finished.

use flowcus_proto::task::{MAX_TASK_NAME_LENGTH, Task, TaskId};
use flowcus_proto::track::Track;

use super::TaskError;

/// Append-only task list.
#[derive(Debug, Default, Clone)]
pub struct TaskStore {
    /// Tasks in insertion order.
    tasks: Vec<Task>,
    /// Ids of completed tasks, in the order they were completed.
    completed_order: Vec<TaskId>,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `initial` tasks.
    ///
    /// Tasks that are already completed seed the completion order in the
    /// order they appear.
    #[must_use]
    pub fn with_tasks(initial: Vec<Task>) -> Self {
        let completed_order = initial
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id.clone())
            .collect();
        Self {
            tasks: initial,
            completed_order,
        }
    }

    /// Creates a new task and appends it to the list.
    ///
    /// The name is trimmed before validation. A blank emoji falls back to
    /// the default glyph.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NameEmpty`] if the name is blank, or
    /// [`TaskError::NameTooLong`] if it exceeds 256 characters.
    pub fn create_task(
        &mut self,
        name: &str,
        emoji: Option<&str>,
        track: Track,
    ) -> Result<Task, TaskError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TaskError::NameEmpty);
        }
        if name.chars().count() > MAX_TASK_NAME_LENGTH {
            return Err(TaskError::NameTooLong);
        }

        let task = Task::new(name, emoji, track);
        tracing::debug!(task_id = %task.id, uri = %task.track.uri, "task created");
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Marks a task completed.
    ///
    /// Returns `true` if the task existed and was not yet completed. Unknown
    /// and already-completed ids are ignored.
    pub fn complete_task(&mut self, id: &TaskId) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) else {
            return false;
        };
        if task.completed {
            return false;
        }
        task.completed = true;
        self.completed_order.push(id.clone());
        true
    }

    /// Returns the tasks in display order.
    ///
    /// The active task comes first when it is incomplete, followed by the
    /// other incomplete tasks in insertion order, then completed tasks in
    /// the order they were completed.
    #[must_use]
    pub fn view(&self, active: Option<&TaskId>) -> Vec<&Task> {
        let active_task = active.and_then(|id| self.get(id)).filter(|t| !t.completed);

        let mut ordered = Vec::with_capacity(self.tasks.len());
        ordered.extend(active_task);
        ordered.extend(
            self.tasks
                .iter()
                .filter(|t| !t.completed && Some(&t.id) != active_task.map(|a| &a.id)),
        );
        ordered.extend(self.completed_order.iter().filter_map(|id| self.get(id)));
        ordered
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Number of tasks in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterates tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }
}
