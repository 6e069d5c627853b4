//! Local list state: cached pages plus the visible, filtered list.
//!
//! Pages are kept exactly as fetched so the visible list can be re-derived
//! at any time. Inserts and removals are written into both, which avoids a
//! refetch after every change. Every mutation is total: unknown ids turn it
//! into a no-op.

use hearth_core::{Task, TaskId, TaskPage, TaskPatch};

use crate::filter::{FilterSet, Session};

/// Result of [`LocalListState::apply_remove`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// The id was found in the pages or in the visible list.
    pub removed: bool,
    /// The visible list dropped below the low-water mark.
    pub refetch_needed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LocalListState {
    pages: Vec<TaskPage>,
    visible: Vec<Task>,
    low_water_mark: usize,
}

impl LocalListState {
    pub fn new(low_water_mark: usize) -> Self {
        Self {
            pages: Vec::new(),
            visible: Vec::new(),
            low_water_mark,
        }
    }

    pub fn pages(&self) -> &[TaskPage] {
        &self.pages
    }

    pub fn visible(&self) -> &[Task] {
        &self.visible
    }

    /// All cached tasks in page order.
    pub fn base(&self) -> impl Iterator<Item = &Task> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn index_of(&self, id: &TaskId) -> Option<usize> {
        self.visible.iter().position(|task| &task.id == id)
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.visible.iter().find(|task| &task.id == id)
    }

    /// Replace the cached pages and show them unfiltered, in arrival order.
    pub fn apply_fetched_pages(&mut self, pages: Vec<TaskPage>) {
        self.pages = pages;
        self.visible = self.base().cloned().collect();
    }

    /// Append one more page to the cache. The visible list is left for the
    /// next [`apply_filter`](Self::apply_filter).
    pub fn append_page(&mut self, page: TaskPage) {
        self.pages.push(page);
    }

    /// Re-derive the visible list from the cached pages.
    pub fn apply_filter(&mut self, filters: &FilterSet, session: &Session) {
        self.visible = self
            .base()
            .filter(|task| filters.accepts(task, session))
            .cloned()
            .collect();
    }

    /// Merge a patch into the matching task, in pages and visible list.
    pub fn apply_patch(&mut self, id: &TaskId, patch: &TaskPatch) -> bool {
        let mut found = false;
        for task in self.tasks_mut().filter(|task| &task.id == id) {
            task.apply(patch);
            found = true;
        }
        found
    }

    /// Replace the matching task with a newer copy. Unknown ids are ignored.
    pub fn apply_replace(&mut self, updated: &Task) -> bool {
        let mut found = false;
        for task in self.tasks_mut().filter(|task| task.id == updated.id) {
            *task = updated.clone();
            found = true;
        }
        found
    }

    /// Show `task` in place of its visible copy without touching the pages.
    pub fn apply_visible_override(&mut self, task: &Task) {
        if let Some(index) = self.index_of(&task.id) {
            self.visible[index] = task.clone();
        }
    }

    /// Prepend a task to the first page and to the visible list.
    ///
    /// A task that is already known is replaced in place instead.
    pub fn apply_insert_front(&mut self, task: Task) {
        if self.apply_replace(&task) {
            return;
        }
        match self.pages.first_mut() {
            Some(first) => first.items.insert(0, task.clone()),
            None => self.pages.push(TaskPage {
                items: vec![task.clone()],
                next_cursor: None,
            }),
        }
        self.visible.insert(0, task);
    }

    /// Remove a task from pages and visible list.
    pub fn apply_remove(&mut self, id: &TaskId) -> RemoveOutcome {
        let mut removed = false;
        for page in &mut self.pages {
            let before = page.items.len();
            page.items.retain(|task| &task.id != id);
            removed |= page.items.len() != before;
        }
        if let Some(index) = self.index_of(id) {
            self.visible.remove(index);
            removed = true;
        }

        RemoveOutcome {
            removed,
            refetch_needed: removed && self.visible.len() < self.low_water_mark,
        }
    }

    /// Move a visible task from one index to another. The destination is
    /// clamped to the end of the list. Returns the final index.
    ///
    /// The cached pages are reordered too, so a later re-derivation keeps
    /// the moved task next to its new neighbour.
    pub fn move_visible(&mut self, from: usize, to: usize) -> Option<usize> {
        if from >= self.visible.len() {
            return None;
        }
        let task = self.visible.remove(from);
        let to = to.min(self.visible.len());
        self.visible.insert(to, task);
        self.reseat_in_pages(to);
        Some(to)
    }

    fn reseat_in_pages(&mut self, index: usize) {
        let moved_id = self.visible[index].id.clone();
        let anchor = match self.visible.get(index + 1) {
            Some(following) => Some((following.id.clone(), false)),
            None => index
                .checked_sub(1)
                .map(|previous| (self.visible[previous].id.clone(), true)),
        };
        let Some((anchor_id, after)) = anchor else {
            return;
        };

        let mut taken = None;
        for page in &mut self.pages {
            if let Some(i) = page.items.iter().position(|t| t.id == moved_id) {
                taken = Some(page.items.remove(i));
                break;
            }
        }
        let Some(task) = taken else {
            return;
        };

        for page in &mut self.pages {
            if let Some(i) = page.items.iter().position(|t| t.id == anchor_id) {
                page.items.insert(if after { i + 1 } else { i }, task);
                return;
            }
        }
        if let Some(first) = self.pages.first_mut() {
            first.items.insert(0, task);
        }
    }

    fn tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.items.iter_mut())
            .chain(self.visible.iter_mut())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_core::{TaskCursor, TaskType};

    pub(crate) fn task(id: &str, title: &str, position: f64) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::parse(id).unwrap(),
            title: title.to_string(),
            description: None,
            completed: false,
            author_id: "alice".to_string(),
            task_type: TaskType::Task,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn page(tasks: Vec<Task>, next: Option<&str>) -> TaskPage {
        TaskPage {
            items: tasks,
            next_cursor: next.map(cursor),
        }
    }

    /// Cursor for the first task of a following page; positions are not compared in these tests.
    pub(crate) fn cursor(id: &str) -> TaskCursor {
        TaskCursor {
            position: 0.0,
            id: TaskId::parse(id).unwrap(),
        }
    }

    pub(crate) fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn id(raw: &str) -> TaskId {
        TaskId::parse(raw).unwrap()
    }

    fn loaded(low_water_mark: usize) -> LocalListState {
        let mut state = LocalListState::new(low_water_mark);
        state.apply_fetched_pages(vec![
            page(vec![task("a", "A", 30.0), task("b", "B #home", 20.0)], Some("c")),
            page(vec![task("c", "C", 10.0)], None),
        ]);
        state
    }

    #[test]
    fn test_fetched_pages_flatten_in_arrival_order() {
        let state = loaded(0);
        assert_eq!(ids(state.visible()), vec!["a", "b", "c"]);
        assert_eq!(state.base().count(), 3);
    }

    #[test]
    fn test_filter_does_not_touch_pages() {
        let mut state = loaded(0);
        let filters = FilterSet {
            hashtag: Some("home".to_string()),
            ..FilterSet::default()
        };

        state.apply_filter(&filters, &Session::default());
        assert_eq!(ids(state.visible()), vec!["b"]);
        assert_eq!(state.base().count(), 3);

        state.apply_filter(&FilterSet::default(), &Session::default());
        assert_eq!(ids(state.visible()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_patch_updates_pages_and_visible() {
        let mut state = loaded(0);
        assert!(state.apply_patch(&id("c"), &TaskPatch::completed(true)));

        assert!(state.get(&id("c")).unwrap().completed);
        assert!(state.base().find(|t| t.id == id("c")).unwrap().completed);
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut state = loaded(5);
        let before: Vec<Task> = state.visible().to_vec();

        assert!(!state.apply_patch(&id("zzz"), &TaskPatch::completed(true)));
        assert!(!state.apply_replace(&task("zzz", "Ghost", 1.0)));
        let outcome = state.apply_remove(&id("zzz"));

        assert_eq!(outcome, RemoveOutcome::default());
        assert_eq!(state.visible(), before.as_slice());
    }

    #[test]
    fn test_insert_front() {
        let mut state = loaded(0);
        state.apply_insert_front(task("n", "New", 40.0));

        assert_eq!(ids(state.visible()), vec!["n", "a", "b", "c"]);
        assert_eq!(ids(&state.pages()[0].items), vec!["n", "a", "b"]);

        // Known ids are replaced rather than duplicated
        state.apply_insert_front(task("n", "Renamed", 40.0));
        assert_eq!(state.visible().len(), 4);
        assert_eq!(state.visible()[0].title, "Renamed");
    }

    #[test]
    fn test_insert_front_into_empty_state() {
        let mut state = LocalListState::new(5);
        state.apply_insert_front(task("n", "New", 1.0));

        assert_eq!(state.pages().len(), 1);
        assert_eq!(ids(state.visible()), vec!["n"]);
    }

    #[test]
    fn test_remove_signals_low_water_mark() {
        let mut state = loaded(3);

        let outcome = state.apply_remove(&id("a"));
        assert!(outcome.removed);
        assert!(outcome.refetch_needed);
        assert_eq!(ids(state.visible()), vec!["b", "c"]);
        assert_eq!(state.base().count(), 2);
    }

    #[test]
    fn test_move_visible_clamps_destination() {
        let mut state = loaded(0);

        assert_eq!(state.move_visible(0, 10), Some(2));
        assert_eq!(ids(state.visible()), vec!["b", "c", "a"]);
        assert_eq!(state.move_visible(5, 0), None);
    }

    #[test]
    fn test_move_survives_refilter() {
        let mut state = loaded(0);

        state.move_visible(2, 0);
        assert_eq!(ids(state.visible()), vec!["c", "a", "b"]);
        assert_eq!(ids(&state.pages()[0].items), vec!["c", "a", "b"]);
        assert!(state.pages()[1].items.is_empty());

        state.apply_filter(&FilterSet::default(), &Session::default());
        assert_eq!(ids(state.visible()), vec!["c", "a", "b"]);
    }
}
