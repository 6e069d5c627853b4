//! Reconciliation of fetches, optimistic edits, real-time events and filters.
//!
//! [`Reconciler`] is a plain state machine. Inputs mutate the
//! [`LocalListState`] and return the [`FetchCommand`]s the driver should
//! run; results of those commands come back tagged with the fetch
//! generation they were issued under so that superseded results are dropped.

use hearth_core::{ListConfig, RealtimeEvent, Task, TaskCursor, TaskId, TaskPage, TaskPatch};
use tracing::{debug, info};

use crate::drag::{DragController, DragLocation, DropOutcome};
use crate::filter::{AuthorFilter, FilterSet, Session};
use crate::state::LocalListState;

/// Fetch work requested by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchCommand {
    /// Load the page starting at `cursor` and append it.
    NextPage { generation: u64, cursor: TaskCursor },
    /// Reload the first `pages` pages and replace the cache with them.
    Refetch { generation: u64, pages: usize },
}

impl FetchCommand {
    pub fn generation(&self) -> u64 {
        match self {
            Self::NextPage { generation, .. } | Self::Refetch { generation, .. } => *generation,
        }
    }
}

/// Pagination status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    /// Bumped by every refetch; results of older generations are stale.
    pub generation: u64,
    pub next_cursor: Option<TaskCursor>,
    pub pages_loaded: usize,
    pub fetch_in_flight: bool,
    /// Latched from the moment a refetch is requested until its pages land.
    pub refetch_pending: bool,
}

impl Pagination {
    pub fn has_next_page(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Delete confirmation state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletionState {
    pub is_being_deleted: Option<TaskId>,
    pub in_progress: bool,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    state: LocalListState,
    filters: FilterSet,
    session: Session,
    pagination: Pagination,
    deletion: DeletionState,
    edited: Option<Task>,
    scroll_threshold: f64,
}

impl Reconciler {
    pub fn new(config: &ListConfig, session: Session) -> Self {
        Self {
            state: LocalListState::new(config.low_water_mark),
            filters: FilterSet::default(),
            session,
            pagination: Pagination::default(),
            deletion: DeletionState::default(),
            edited: None,
            scroll_threshold: config.scroll_threshold,
        }
    }

    pub fn visible(&self) -> &[Task] {
        self.state.visible()
    }

    pub fn state(&self) -> &LocalListState {
        &self.state
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn deletion(&self) -> &DeletionState {
        &self.deletion
    }

    pub fn edited(&self) -> Option<&Task> {
        self.edited.as_ref()
    }

    /// Initial load: fetch the first page.
    pub fn start(&mut self) -> Option<FetchCommand> {
        self.request_refetch()
    }

    // --- fetch results ---

    /// Apply the pages of a refetch, replacing the cache.
    pub fn on_pages_fetched(&mut self, generation: u64, pages: Vec<TaskPage>) {
        if !self.is_current(generation) {
            return;
        }
        self.pagination.next_cursor = pages.last().and_then(|page| page.next_cursor.clone());
        self.pagination.pages_loaded = pages.len();
        self.pagination.fetch_in_flight = false;
        self.pagination.refetch_pending = false;
        self.state.apply_fetched_pages(pages);
        self.rederive();
        info!(
            visible = self.state.visible().len(),
            pages = self.pagination.pages_loaded,
            "Task list loaded"
        );
    }

    /// Append a page fetched by [`FetchCommand::NextPage`].
    pub fn on_page_fetched(&mut self, generation: u64, page: TaskPage) {
        if !self.is_current(generation) {
            return;
        }
        self.pagination.next_cursor = page.next_cursor.clone();
        self.pagination.pages_loaded += 1;
        self.pagination.fetch_in_flight = false;
        self.state.append_page(page);
        self.rederive();
    }

    /// A fetch failed. The latch is released so a later input can retry.
    pub fn on_fetch_failed(&mut self, generation: u64) {
        if !self.is_current(generation) {
            return;
        }
        self.pagination.fetch_in_flight = false;
        self.pagination.refetch_pending = false;
    }

    /// Scroll input in percent of the scrollable range.
    pub fn on_scroll(&mut self, percent: f64) -> Option<FetchCommand> {
        if percent <= self.scroll_threshold || self.pagination.fetch_in_flight {
            return None;
        }
        let cursor = self.pagination.next_cursor.clone()?;
        self.pagination.fetch_in_flight = true;
        debug!(%cursor, "Requesting next page");
        Some(FetchCommand::NextPage {
            generation: self.pagination.generation,
            cursor,
        })
    }

    // --- real-time events ---

    /// Apply a real-time event. Shopping events are not handled here.
    pub fn on_event(&mut self, event: &RealtimeEvent) -> Option<FetchCommand> {
        match event {
            RealtimeEvent::TaskCreated(payload) => {
                self.state.apply_insert_front(payload.task.clone());
                self.rederive();
                None
            }
            RealtimeEvent::TaskUpdated(payload) | RealtimeEvent::ApiTaskUpdated(payload) => {
                if self.edited.as_ref().map(|t| &t.id) == Some(&payload.task.id) {
                    self.edited = None;
                }
                if self.state.apply_replace(&payload.task) {
                    self.rederive();
                } else {
                    debug!(task = %payload.task.id, "Update for unknown task ignored");
                }
                None
            }
            RealtimeEvent::TaskDeleted(payload) | RealtimeEvent::ApiTaskDeleted(payload) => {
                self.remove(&payload.task.id)
            }
            _ => None,
        }
    }

    // --- filters ---

    pub fn set_author_filter(&mut self, author: AuthorFilter) {
        self.filters.author = author;
        self.rederive();
    }

    pub fn toggle_hashtag(&mut self, button_text: &str) {
        self.filters.toggle_hashtag(button_text);
        self.rederive();
    }

    pub fn set_type_filter(&mut self, task_type: Option<hearth_core::TaskType>) {
        self.filters.task_type = task_type;
        self.rederive();
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = session;
        self.rederive();
    }

    // --- optimistic edits ---

    /// Show a locally edited copy of a task until the server's version arrives.
    pub fn edit_locally(&mut self, task: Task) {
        self.edited = Some(task);
        self.rederive();
    }

    /// Flip the completion flag locally. Returns the new value to persist.
    pub fn toggle_status(&mut self, id: &TaskId) -> Option<bool> {
        let completed = !self.state.get(id)?.completed;
        self.state.apply_patch(id, &TaskPatch::completed(completed));
        if let Some(edited) = self.edited.as_mut().filter(|t| &t.id == id) {
            edited.completed = completed;
        }
        self.rederive();
        Some(completed)
    }

    /// The server confirmed a mutation; take its record as the truth.
    pub fn on_mutation_confirmed(&mut self, task: &Task) {
        if self.state.apply_replace(task) {
            self.rederive();
        }
    }

    /// Finish a drag gesture. The moved task's position is updated locally.
    pub fn apply_drop(
        &mut self,
        drag: &mut DragController,
        destination: Option<DragLocation>,
    ) -> DropOutcome {
        let outcome = drag.drop(&mut self.state, destination);
        if let DropOutcome::Moved {
            reposition: Some(reposition),
            ..
        } = &outcome
        {
            if let Some(edited) = self.edited.as_mut().filter(|t| t.id == reposition.id) {
                edited.position = reposition.position;
            }
        }
        outcome
    }

    // --- deletion ---

    /// Mark a task as being deleted. Only one delete runs at a time.
    pub fn begin_delete(&mut self, id: &TaskId) -> bool {
        if self.deletion.in_progress || self.state.get(id).is_none() {
            return false;
        }
        self.deletion = DeletionState {
            is_being_deleted: Some(id.clone()),
            in_progress: true,
        };
        true
    }

    pub fn on_delete_succeeded(&mut self, id: &TaskId) -> Option<FetchCommand> {
        self.deletion = DeletionState::default();
        self.remove(id)
    }

    /// The task stays where it is; `is_being_deleted` keeps pointing at it.
    pub fn on_delete_failed(&mut self, id: &TaskId) {
        debug!(task = %id, "Delete failed, keeping task");
        self.deletion.in_progress = false;
    }

    fn remove(&mut self, id: &TaskId) -> Option<FetchCommand> {
        let outcome = self.state.apply_remove(id);
        if !outcome.removed {
            debug!(task = %id, "Delete for unknown task ignored");
            return None;
        }
        if self.edited.as_ref().map(|t| &t.id) == Some(id) {
            self.edited = None;
        }
        self.rederive();
        if outcome.refetch_needed {
            self.request_refetch()
        } else {
            None
        }
    }

    fn request_refetch(&mut self) -> Option<FetchCommand> {
        if self.pagination.refetch_pending {
            return None;
        }
        self.pagination.generation += 1;
        self.pagination.refetch_pending = true;
        self.pagination.fetch_in_flight = true;
        let pages = self.pagination.pages_loaded.max(1);
        info!(generation = self.pagination.generation, pages, "Refetching task list");
        Some(FetchCommand::Refetch {
            generation: self.pagination.generation,
            pages,
        })
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.pagination.generation {
            debug!(
                generation,
                current = self.pagination.generation,
                "Dropping stale fetch result"
            );
            return false;
        }
        true
    }

    /// Derive the visible list from the cache, then overlay the edited task.
    fn rederive(&mut self) {
        self.state.apply_filter(&self.filters, &self.session);
        if let Some(edited) = &self.edited {
            self.state.apply_visible_override(edited);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{cursor, ids, page, task};

    fn config() -> ListConfig {
        ListConfig {
            page_size: 2,
            low_water_mark: 5,
            scroll_threshold: 85.0,
        }
    }

    fn id(raw: &str) -> TaskId {
        TaskId::parse(raw).unwrap()
    }

    fn loaded(tasks: Vec<Task>, next: Option<&str>) -> Reconciler {
        let mut reconciler = Reconciler::new(&config(), Session::signed_in("alice"));
        let command = reconciler.start().unwrap();
        reconciler.on_pages_fetched(command.generation(), vec![page(tasks, next)]);
        reconciler
    }

    fn six() -> Vec<Task> {
        (0..6)
            .map(|i| task(&format!("t{}", i), &format!("Task {}", i), (60 - i * 10) as f64))
            .collect()
    }

    #[test]
    fn test_start_requests_first_page() {
        let mut reconciler = Reconciler::new(&config(), Session::default());
        assert_eq!(
            reconciler.start(),
            Some(FetchCommand::Refetch {
                generation: 1,
                pages: 1
            })
        );
        // Latched until the pages arrive
        assert_eq!(reconciler.start(), None);
    }

    #[test]
    fn test_scroll_threshold_is_strict() {
        let mut reconciler = loaded(vec![task("a", "A", 2.0), task("b", "B", 1.0)], Some("c"));

        assert_eq!(reconciler.on_scroll(85.0), None);
        let command = reconciler.on_scroll(85.5).unwrap();
        assert_eq!(
            command,
            FetchCommand::NextPage {
                generation: 1,
                cursor: cursor("c")
            }
        );
        // Already in flight
        assert_eq!(reconciler.on_scroll(99.0), None);

        reconciler.on_page_fetched(1, page(vec![task("c", "C", 0.5)], None));
        assert_eq!(ids(reconciler.visible()), vec!["a", "b", "c"]);
        assert_eq!(reconciler.on_scroll(99.0), None);
    }

    #[test]
    fn test_failed_next_page_can_be_retried() {
        let mut reconciler = loaded(vec![task("a", "A", 2.0), task("b", "B", 1.0)], Some("c"));

        let first = reconciler.on_scroll(90.0).unwrap();
        reconciler.on_fetch_failed(first.generation());

        assert!(!reconciler.pagination().fetch_in_flight);
        assert_eq!(reconciler.pagination().next_cursor, Some(cursor("c")));
        assert_eq!(reconciler.on_scroll(90.0), Some(first));
    }

    #[test]
    fn test_deleted_cursor_task_keeps_paging() {
        let mut reconciler = loaded(vec![task("a", "A", 2.0), task("b", "B", 1.0)], Some("c"));

        // The first task of the next page is deleted before it was ever loaded
        let event = RealtimeEvent::task_deleted(task("c", "C", 0.0));
        assert_eq!(reconciler.on_event(&event), None);
        assert_eq!(ids(reconciler.visible()), vec!["a", "b"]);

        let next = reconciler.on_scroll(90.0).unwrap();
        assert_eq!(
            next,
            FetchCommand::NextPage {
                generation: 1,
                cursor: cursor("c")
            }
        );
        reconciler.on_page_fetched(next.generation(), page(vec![task("d", "D", -1.0)], None));
        assert_eq!(ids(reconciler.visible()), vec!["a", "b", "d"]);
        assert!(!reconciler.pagination().has_next_page());
    }

    #[test]
    fn test_low_water_mark_refetches_once() {
        let mut reconciler = loaded(six(), None);
        let mut commands = Vec::new();

        for i in 0..6 {
            let event = RealtimeEvent::task_deleted(task(&format!("t{}", i), "", 0.0));
            commands.extend(reconciler.on_event(&event));
        }

        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], FetchCommand::Refetch { generation: 2, .. }));
        assert!(reconciler.visible().is_empty());
    }

    #[test]
    fn test_stale_page_is_dropped() {
        let mut reconciler = loaded(six(), Some("t9"));
        let next = reconciler.on_scroll(90.0).unwrap();

        // A refetch supersedes the in-flight page
        let mut refetch = None;
        for i in 0..2 {
            let event = RealtimeEvent::task_deleted(task(&format!("t{}", i), "", 0.0));
            refetch = refetch.or(reconciler.on_event(&event));
        }
        let refetch = refetch.unwrap();
        assert!(refetch.generation() > next.generation());

        reconciler.on_page_fetched(next.generation(), page(vec![task("t9", "Old", 1.0)], None));
        assert!(reconciler.state().get(&id("t9")).is_none());

        reconciler.on_pages_fetched(refetch.generation(), vec![page(six(), None)]);
        assert_eq!(reconciler.visible().len(), 6);
        assert!(!reconciler.pagination().refetch_pending);
    }

    #[test]
    fn test_created_event_applies_while_fetch_in_flight() {
        let mut reconciler = loaded(vec![task("a", "A", 2.0)], Some("b"));
        reconciler.on_scroll(95.0).unwrap();
        assert!(reconciler.pagination().fetch_in_flight);

        reconciler.on_event(&RealtimeEvent::task_created(task("n", "New", 3.0)));
        assert_eq!(ids(reconciler.visible()), vec!["n", "a"]);
    }

    #[test]
    fn test_unknown_id_events_are_noops() {
        let mut reconciler = loaded(six(), None);
        let before = reconciler.visible().to_vec();

        assert_eq!(
            reconciler.on_event(&RealtimeEvent::api_task_updated(task("zz", "Ghost", 1.0))),
            None
        );
        assert_eq!(
            reconciler.on_event(&RealtimeEvent::task_deleted(task("zz", "Ghost", 1.0))),
            None
        );
        assert_eq!(reconciler.visible(), before.as_slice());
    }

    #[test]
    fn test_update_event_replaces_task() {
        let mut reconciler = loaded(six(), None);
        let mut updated = task("t2", "Renamed #home", 40.0);
        updated.completed = true;

        reconciler.on_event(&RealtimeEvent::api_task_updated(updated.clone()));
        assert_eq!(reconciler.state().get(&id("t2")), Some(&updated));
    }

    #[test]
    fn test_filters_rederive_from_cache() {
        let mut tasks = six();
        tasks[1].title = "Buy milk #grocery-urgent".to_string();
        tasks[3].author_id = "bob".to_string();
        let mut reconciler = loaded(tasks, None);

        reconciler.toggle_hashtag("#grocery");
        assert_eq!(ids(reconciler.visible()), vec!["t1"]);

        reconciler.toggle_hashtag("#grocery");
        reconciler.set_author_filter(AuthorFilter::Mine);
        assert_eq!(reconciler.visible().len(), 5);
        assert!(reconciler.state().get(&id("t3")).is_none());

        reconciler.set_session(Session::default());
        assert!(reconciler.visible().is_empty());
        assert_eq!(reconciler.state().base().count(), 6);
    }

    #[test]
    fn test_filtered_out_insert_stays_in_cache() {
        let mut reconciler = loaded(six(), None);
        reconciler.set_type_filter(Some(hearth_core::TaskType::Note));

        reconciler.on_event(&RealtimeEvent::task_created(task("n", "New", 99.0)));
        assert!(reconciler.visible().is_empty());

        reconciler.set_type_filter(None);
        assert_eq!(reconciler.visible()[0].id.as_str(), "n");
    }

    #[test]
    fn test_toggle_status_is_optimistic() {
        let mut reconciler = loaded(six(), None);

        assert_eq!(reconciler.toggle_status(&id("t0")), Some(true));
        assert!(reconciler.state().get(&id("t0")).unwrap().completed);
        assert_eq!(reconciler.toggle_status(&id("missing")), None);
    }

    #[test]
    fn test_edited_task_overrides_fetched_copy() {
        let mut reconciler = loaded(six(), None);
        let mut edited = reconciler.visible()[2].clone();
        edited.title = "Edited locally".to_string();

        reconciler.edit_locally(edited.clone());
        reconciler.set_author_filter(AuthorFilter::All);
        assert_eq!(reconciler.visible()[2].title, "Edited locally");

        // The server's copy replaces the override
        let mut confirmed = edited.clone();
        confirmed.title = "Edited on server".to_string();
        reconciler.on_event(&RealtimeEvent::task_updated(confirmed));
        assert!(reconciler.edited().is_none());
        assert_eq!(reconciler.visible()[2].title, "Edited on server");
    }

    #[test]
    fn test_delete_flow() {
        let mut reconciler = loaded(six(), None);

        assert!(reconciler.begin_delete(&id("t0")));
        assert!(!reconciler.begin_delete(&id("t1")));

        reconciler.on_delete_failed(&id("t0"));
        assert_eq!(reconciler.deletion().is_being_deleted, Some(id("t0")));
        assert!(!reconciler.deletion().in_progress);
        assert_eq!(reconciler.visible().len(), 6);

        assert!(reconciler.begin_delete(&id("t0")));
        assert_eq!(reconciler.on_delete_succeeded(&id("t0")), None);
        assert_eq!(reconciler.deletion(), &DeletionState::default());
        assert_eq!(reconciler.visible().len(), 5);
    }

    #[test]
    fn test_drop_updates_position_locally() {
        let mut reconciler = loaded(
            vec![task("a", "A", 30.0), task("b", "B", 20.0), task("c", "C", 10.0)],
            None,
        );
        let mut drag = DragController::new();
        drag.begin(id("c"), DragLocation::at(2));

        let outcome = reconciler.apply_drop(&mut drag, Some(DragLocation::at(0)));
        assert!(matches!(outcome, DropOutcome::Moved { index: 0, .. }));

        // A later re-derivation keeps the new order and position
        reconciler.set_author_filter(AuthorFilter::All);
        assert_eq!(ids(reconciler.visible()), vec!["c", "a", "b"]);
        assert_eq!(reconciler.visible()[0].position, 1054.0);
    }
}
