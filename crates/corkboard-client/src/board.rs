// SPDX-License-Identifier: Apache-2.0

use corkboard_core::{position_between, ProjectId, TaskId};
use corkboard_model::{ServerEvent, Task, TaskStatus};

/// Where a drag is currently hovering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    /// Over a column's empty space: the task goes to the end of that column.
    Column(TaskStatus),
    /// Over a sibling card: the task takes that card's slot and column.
    Task(TaskId),
}

/// The durable outcome of a drag: what to persist and what to relay to
/// peers. Status and position always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveIntent {
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub status: TaskStatus,
    pub position: f64,
}

fn column_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Todo => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Review => 2,
        TaskStatus::Done => 3,
    }
}

/// In-memory board state for one project.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    tasks: Vec<Task>,
    dragging: Option<TaskId>,
}

impl BoardState {
    /// Build from an authoritative fetch.
    #[must_use]
    pub fn from_snapshot(tasks: Vec<Task>) -> Self {
        let mut state = Self {
            tasks,
            dragging: None,
        };
        state.sort_by_position();
        state
    }

    fn sort_by_position(&mut self) {
        self.tasks.sort_by(|a, b| {
            column_rank(a.status)
                .cmp(&column_rank(b.status))
                .then(a.position.total_cmp(&b.position))
                .then(a.id.cmp(&b.id))
        });
    }

    fn index_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Tasks of one column in current render order.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Capture the dragged task. Returns false for unknown ids.
    pub fn drag_start(&mut self, id: &TaskId) -> bool {
        if self.index_of(id).is_some() {
            self.dragging = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Speculative visual update while hovering; no positions change and
    /// nothing leaves the process.
    pub fn drag_over(&mut self, target: &DragTarget) {
        let Some(dragged_id) = self.dragging.clone() else {
            return;
        };
        let Some(from) = self.index_of(&dragged_id) else {
            return;
        };
        match target {
            DragTarget::Column(status) => {
                if self.tasks[from].status == *status {
                    return;
                }
                let mut task = self.tasks.remove(from);
                task.status = *status;
                let insert_at = self
                    .tasks
                    .iter()
                    .rposition(|t| t.status == *status)
                    .map_or(self.tasks.len(), |i| i + 1);
                self.tasks.insert(insert_at, task);
            }
            DragTarget::Task(over_id) => {
                if over_id == &dragged_id {
                    return;
                }
                let Some(over) = self.index_of(over_id) else {
                    return;
                };
                let over_status = self.tasks[over].status;
                let mut task = self.tasks.remove(from);
                task.status = over_status;
                // Lands after the hovered card when dragging down, before it
                // when dragging up — the array-move convention.
                let insert_at = over.min(self.tasks.len());
                self.tasks.insert(insert_at, task);
            }
        }
    }

    /// Finish the drag: compute the final (status, position) pair from the
    /// speculative neighbors, apply it locally, and hand the caller the
    /// intent to broadcast and persist. The two outbound paths are
    /// independent — the broadcast hides latency, the persistence call is
    /// the durable source of truth.
    pub fn drag_end(&mut self, now_ms: i64) -> Option<MoveIntent> {
        let dragged_id = self.dragging.take()?;
        let index = self.index_of(&dragged_id)?;
        let status = self.tasks[index].status;

        let before = self.tasks[..index]
            .iter()
            .rev()
            .find(|t| t.status == status)
            .map(|t| t.position);
        let after = self.tasks[index + 1..]
            .iter()
            .find(|t| t.status == status)
            .map(|t| t.position);
        let position = position_between(before, after, now_ms);

        let task = &mut self.tasks[index];
        task.position = position;
        let intent = MoveIntent {
            task_id: task.id.clone(),
            project_id: task.project_id.clone(),
            status,
            position,
        };
        self.sort_by_position();
        Some(intent)
    }

    /// Merge one inbound broadcast event, last-applied-wins by task id.
    /// Non-task events are ignored here; they feed other surfaces.
    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::TaskCreated { task, .. } | ServerEvent::TaskUpdated { task, .. } => {
                self.upsert(task.clone());
            }
            ServerEvent::TaskMoved {
                task_id,
                status,
                position,
                ..
            } => {
                if let Some(index) = self.index_of(task_id) {
                    let task = &mut self.tasks[index];
                    task.status = *status;
                    task.position = *position;
                    self.sort_by_position();
                }
            }
            ServerEvent::TaskDeleted { task_id, .. } => {
                if let Some(index) = self.index_of(task_id) {
                    self.tasks.remove(index);
                    if self.dragging.as_ref() == Some(task_id) {
                        self.dragging = None;
                    }
                }
            }
            _ => {}
        }
    }

    fn upsert(&mut self, task: Task) {
        match self.index_of(&task.id) {
            Some(index) => self.tasks[index] = task,
            None => self.tasks.push(task),
        }
        self.sort_by_position();
    }

    /// Replace everything with a fresh authoritative snapshot, discarding
    /// unmerged optimistic state.
    pub fn revalidate(&mut self, snapshot: Vec<Task>) {
        self.tasks = snapshot;
        self.dragging = None;
        self.sort_by_position();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corkboard_core::{ProjectId, TaskId, UserId};
    use corkboard_model::{PresenceUser, TaskPriority};

    fn task(project: &ProjectId, title: &str, status: TaskStatus, position: f64) -> Task {
        Task {
            id: TaskId::mint(),
            project_id: project.clone(),
            title: title.to_string(),
            description: None,
            priority: TaskPriority::Medium,
            status,
            due_date: None,
            created_by: UserId::mint(),
            position,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn presence() -> PresenceUser {
        PresenceUser {
            id: UserId::mint(),
            display_name: "peer".to_string(),
            avatar_url: None,
        }
    }

    fn board() -> (BoardState, ProjectId, Vec<TaskId>) {
        let project = ProjectId::mint();
        let a = task(&project, "a", TaskStatus::Todo, 100.0);
        let b = task(&project, "b", TaskStatus::Todo, 200.0);
        let c = task(&project, "c", TaskStatus::Todo, 300.0);
        let d = task(&project, "d", TaskStatus::Done, 100.0);
        let ids = vec![a.id.clone(), b.id.clone(), c.id.clone(), d.id.clone()];
        (BoardState::from_snapshot(vec![a, b, c, d]), project, ids)
    }

    #[test]
    fn reorder_within_column_changes_only_the_dragged_position() {
        let (mut state, _, ids) = board();
        let (a, b, c) = (&ids[0], &ids[1], &ids[2]);

        assert!(state.drag_start(c));
        state.drag_over(&DragTarget::Task(b.clone()));
        let intent = state.drag_end(1_000_000).expect("intent");

        assert_eq!(&intent.task_id, c);
        assert_eq!(intent.status, TaskStatus::Todo);
        assert!(intent.position > 100.0 && intent.position < 200.0);

        // Neighbors kept their stored positions.
        assert_eq!(state.task(a).expect("a").position, 100.0);
        assert_eq!(state.task(b).expect("b").position, 200.0);

        let todo: Vec<_> = state
            .column(TaskStatus::Todo)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(todo, vec![a.clone(), c.clone(), b.clone()]);
    }

    #[test]
    fn cross_column_drag_updates_status_and_position_together() {
        let (mut state, _, ids) = board();
        let a = &ids[0];

        assert!(state.drag_start(a));
        state.drag_over(&DragTarget::Column(TaskStatus::Done));
        let intent = state.drag_end(5_000_000).expect("intent");

        assert_eq!(intent.status, TaskStatus::Done);
        let moved = state.task(a).expect("moved");
        assert_eq!(moved.status, TaskStatus::Done);
        assert_eq!(moved.position, intent.position);
        assert!(moved.position > 100.0);
        assert_eq!(state.column(TaskStatus::Todo).len(), 2);
        assert_eq!(state.column(TaskStatus::Done).len(), 2);
    }

    #[test]
    fn hovering_a_card_adopts_its_column() {
        let (mut state, _, ids) = board();
        let (a, d) = (&ids[0], &ids[3]);

        assert!(state.drag_start(a));
        state.drag_over(&DragTarget::Task(d.clone()));
        assert_eq!(state.task(a).expect("a").status, TaskStatus::Done);

        let intent = state.drag_end(9_000_000).expect("intent");
        assert_eq!(intent.status, TaskStatus::Done);
    }

    #[test]
    fn inbound_moves_merge_last_applied_wins() {
        let (mut state, _, ids) = board();
        let b = &ids[1];

        let event = ServerEvent::TaskMoved {
            task_id: b.clone(),
            project_id: state.task(b).expect("b").project_id.clone(),
            status: TaskStatus::Review,
            position: 50.0,
            moved_by: presence(),
        };
        state.apply(&event);
        let b_task = state.task(b).expect("b");
        assert_eq!(b_task.status, TaskStatus::Review);
        assert_eq!(b_task.position, 50.0);

        // A later event overwrites again, no merge arithmetic.
        let event = ServerEvent::TaskMoved {
            task_id: b.clone(),
            project_id: b_task.project_id.clone(),
            status: TaskStatus::Todo,
            position: 75.0,
            moved_by: presence(),
        };
        state.apply(&event);
        assert_eq!(state.task(b).expect("b").status, TaskStatus::Todo);
    }

    #[test]
    fn creates_insert_in_column_order_and_deletes_remove() {
        let (mut state, project, ids) = board();

        let fresh = task(&project, "fresh", TaskStatus::Todo, 150.0);
        let fresh_id = fresh.id.clone();
        state.apply(&ServerEvent::TaskCreated {
            task: fresh,
            created_by: presence(),
            project_name: "Launch".to_string(),
        });
        let todo: Vec<_> = state
            .column(TaskStatus::Todo)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(todo[1], fresh_id);

        state.apply(&ServerEvent::TaskDeleted {
            task_id: fresh_id.clone(),
            project_id: project.clone(),
            deleted_by: presence(),
        });
        assert!(state.task(&fresh_id).is_none());
        assert_eq!(state.len(), ids.len());
    }

    #[test]
    fn moves_for_unknown_tasks_are_ignored() {
        let (mut state, project, _) = board();
        let before = state.len();
        state.apply(&ServerEvent::TaskMoved {
            task_id: TaskId::mint(),
            project_id: project,
            status: TaskStatus::Done,
            position: 1.0,
            moved_by: presence(),
        });
        assert_eq!(state.len(), before);
    }

    #[test]
    fn revalidation_discards_optimistic_state() {
        let (mut state, project, ids) = board();
        let a = &ids[0];

        assert!(state.drag_start(a));
        state.drag_over(&DragTarget::Column(TaskStatus::Review));
        // Navigation back: authoritative refetch arrives mid-drag.
        let snapshot = vec![task(&project, "only", TaskStatus::Todo, 10.0)];
        let only_id = snapshot[0].id.clone();
        state.revalidate(snapshot);

        assert_eq!(state.len(), 1);
        assert!(state.task(a).is_none());
        assert!(state.task(&only_id).is_some());
        // The stale drag no longer produces an intent.
        assert!(state.drag_end(1_000).is_none());
    }
}
