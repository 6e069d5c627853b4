//! Single-writer task that owns all board state.
//!
//! User intents, fetch results, mutation completions and bridge events are
//! all handled on one task, one at a time. Remote calls run on spawned tasks
//! and report back through a completion channel; they are never aborted.

use std::sync::Arc;

use hearth_core::{
    ListConfig, RealtimeEvent, ShoppingItem, Task, TaskCursor, TaskId, TaskPage, TaskType,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::EventBridge;
use crate::drag::{DragController, DragLocation, DragPhase, DropOutcome};
use crate::error::{ClientError, Result};
use crate::filter::{AuthorFilter, FilterSet, Session};
use crate::reconcile::{DeletionState, FetchCommand, Pagination, Reconciler};
use crate::remote::{MutationError, Notification, Notifier, TaskRemote};
use crate::shopping::ShoppingListState;

const MAILBOX_SIZE: usize = 64;

/// Intents sent to the board.
#[derive(Debug)]
pub enum BoardCommand {
    Scroll(f64),
    BeginDrag {
        task_id: TaskId,
        source: DragLocation,
    },
    Drop {
        destination: Option<DragLocation>,
    },
    CancelDrag,
    ToggleStatus(TaskId),
    Delete(TaskId),
    SetAuthorFilter(AuthorFilter),
    ToggleHashtag(String),
    SetTypeFilter(Option<TaskType>),
    SetSession(Session),
    EditLocally(Task),
    SetShoppingItems(Vec<ShoppingItem>),
    Snapshot(oneshot::Sender<BoardSnapshot>),
}

/// Read-only copy of the board state.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub visible: Vec<Task>,
    pub filters: FilterSet,
    pub pagination: Pagination,
    pub deletion: DeletionState,
    pub drag: DragPhase,
    pub shopping: Vec<ShoppingItem>,
}

/// Cloneable sender side of the board mailbox.
#[derive(Debug, Clone)]
pub struct BoardHandle {
    sender: mpsc::Sender<BoardCommand>,
}

impl BoardHandle {
    pub async fn send(&self, command: BoardCommand) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ClientError::BoardClosed)
    }

    pub async fn snapshot(&self) -> Result<BoardSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(BoardCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| ClientError::BoardClosed)
    }

    /// Drag a task from one index of the default list to another.
    pub async fn move_task(&self, task_id: TaskId, from: usize, to: usize) -> Result<()> {
        self.send(BoardCommand::BeginDrag {
            task_id,
            source: DragLocation::at(from),
        })
        .await?;
        self.send(BoardCommand::Drop {
            destination: Some(DragLocation::at(to)),
        })
        .await
    }
}

enum Completion {
    Pages {
        generation: u64,
        result: std::result::Result<Vec<TaskPage>, MutationError>,
    },
    Page {
        generation: u64,
        result: std::result::Result<TaskPage, MutationError>,
    },
    Status(std::result::Result<Task, MutationError>),
    Position(std::result::Result<Task, MutationError>),
    Deleted {
        id: TaskId,
        result: std::result::Result<Task, MutationError>,
    },
}

struct Board {
    reconciler: Reconciler,
    drag: DragController,
    shopping: ShoppingListState,
    remote: Arc<dyn TaskRemote>,
    notifier: Arc<dyn Notifier>,
    page_size: usize,
    completions: mpsc::UnboundedSender<Completion>,
}

/// Start the board on the current tokio runtime.
///
/// The task ends once every [`BoardHandle`] has been dropped.
pub fn spawn_board(
    remote: Arc<dyn TaskRemote>,
    notifier: Arc<dyn Notifier>,
    config: &ListConfig,
    session: Session,
    bridge: Option<Box<dyn EventBridge>>,
) -> (BoardHandle, JoinHandle<()>) {
    let (sender, commands) = mpsc::channel(MAILBOX_SIZE);
    let (completions, completion_rx) = mpsc::unbounded_channel();

    let board = Board {
        reconciler: Reconciler::new(config, session),
        drag: DragController::new(),
        shopping: ShoppingListState::default(),
        remote,
        notifier,
        page_size: config.page_size,
        completions,
    };
    let join = tokio::spawn(board.run(commands, completion_rx, bridge));
    (BoardHandle { sender }, join)
}

impl Board {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<BoardCommand>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        mut bridge: Option<Box<dyn EventBridge>>,
    ) {
        if let Some(command) = self.reconciler.start() {
            self.execute(command);
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(completion) = completions.recv() => self.complete(completion),
                event = next_bridge_event(&mut bridge) => match event {
                    Some(event) => self.on_event(event),
                    None => {
                        info!("Realtime bridge closed");
                        bridge = None;
                    }
                },
            }
        }
        debug!("Board stopped");
    }

    fn handle(&mut self, command: BoardCommand) {
        match command {
            BoardCommand::Scroll(percent) => {
                if let Some(fetch) = self.reconciler.on_scroll(percent) {
                    self.execute(fetch);
                }
            }
            BoardCommand::BeginDrag { task_id, source } => {
                self.drag.begin(task_id, source);
            }
            BoardCommand::Drop { destination } => {
                let outcome = self.reconciler.apply_drop(&mut self.drag, destination);
                if let DropOutcome::Moved {
                    reposition: Some(reposition),
                    ..
                } = outcome
                {
                    let remote = Arc::clone(&self.remote);
                    self.dispatch(
                        async move {
                            remote
                                .update_task_position(&reposition.id, reposition.position)
                                .await
                        },
                        Completion::Position,
                    );
                }
            }
            BoardCommand::CancelDrag => self.drag.cancel(),
            BoardCommand::ToggleStatus(id) => {
                if let Some(completed) = self.reconciler.toggle_status(&id) {
                    let remote = Arc::clone(&self.remote);
                    self.dispatch(
                        async move { remote.update_task_status(&id, completed).await },
                        Completion::Status,
                    );
                }
            }
            BoardCommand::Delete(id) => {
                if self.reconciler.begin_delete(&id) {
                    let remote = Arc::clone(&self.remote);
                    let deleted = id.clone();
                    self.dispatch(
                        async move { remote.delete_task(&id).await },
                        move |result| Completion::Deleted {
                            id: deleted,
                            result,
                        },
                    );
                }
            }
            BoardCommand::SetAuthorFilter(author) => self.reconciler.set_author_filter(author),
            BoardCommand::ToggleHashtag(tag) => self.reconciler.toggle_hashtag(&tag),
            BoardCommand::SetTypeFilter(task_type) => self.reconciler.set_type_filter(task_type),
            BoardCommand::SetSession(session) => self.reconciler.set_session(session),
            BoardCommand::EditLocally(task) => self.reconciler.edit_locally(task),
            BoardCommand::SetShoppingItems(items) => self.shopping = ShoppingListState::new(items),
            BoardCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Pages { generation, result } => match result {
                Ok(pages) => self.reconciler.on_pages_fetched(generation, pages),
                Err(e) => {
                    self.reconciler.on_fetch_failed(generation);
                    self.report(&e);
                }
            },
            Completion::Page { generation, result } => match result {
                Ok(page) => self.reconciler.on_page_fetched(generation, page),
                Err(e) => {
                    self.reconciler.on_fetch_failed(generation);
                    self.report(&e);
                }
            },
            Completion::Status(result) => match result {
                Ok(task) => self.reconciler.on_mutation_confirmed(&task),
                Err(e) => self.report(&e),
            },
            Completion::Position(result) => match result {
                Ok(task) => {
                    self.reconciler.on_mutation_confirmed(&task);
                    self.notifier
                        .notify(Notification::success("Task position updated"));
                }
                Err(e) => self.report(&e),
            },
            Completion::Deleted { id, result } => match result {
                Ok(_) => {
                    if let Some(fetch) = self.reconciler.on_delete_succeeded(&id) {
                        self.execute(fetch);
                    }
                    self.notifier.notify(Notification::success("Task deleted"));
                }
                Err(e) => {
                    self.reconciler.on_delete_failed(&id);
                    self.report(&e);
                }
            },
        }
    }

    fn on_event(&mut self, event: RealtimeEvent) {
        debug!(event = event.name(), "Realtime event");
        if self.shopping.apply(&event) {
            return;
        }
        if let Some(fetch) = self.reconciler.on_event(&event) {
            self.execute(fetch);
        }
    }

    fn execute(&self, command: FetchCommand) {
        let remote = Arc::clone(&self.remote);
        let limit = self.page_size;
        match command {
            FetchCommand::NextPage { generation, cursor } => self.dispatch(
                async move { remote.fetch_page(limit, Some(&cursor)).await },
                move |result| Completion::Page { generation, result },
            ),
            FetchCommand::Refetch { generation, pages } => self.dispatch(
                async move { fetch_pages(remote.as_ref(), limit, pages).await },
                move |result| Completion::Pages { generation, result },
            ),
        }
    }

    /// Run a remote call on its own task and post the result back.
    fn dispatch<T, F>(&self, call: F, wrap: impl FnOnce(T) -> Completion + Send + 'static)
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = call.await;
            // The board may have stopped; the result is no longer needed then.
            let _ = completions.send(wrap(result));
        });
    }

    fn report(&self, error: &MutationError) {
        warn!("Remote call failed: {}", error);
        self.notifier.notify(Notification::error(error.to_string()));
    }

    fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            visible: self.reconciler.visible().to_vec(),
            filters: self.reconciler.filters().clone(),
            pagination: self.reconciler.pagination().clone(),
            deletion: self.reconciler.deletion().clone(),
            drag: self.drag.phase().clone(),
            shopping: self.shopping.items().to_vec(),
        }
    }
}

async fn next_bridge_event(bridge: &mut Option<Box<dyn EventBridge>>) -> Option<RealtimeEvent> {
    match bridge {
        Some(bridge) => bridge.next_event().await,
        None => std::future::pending().await,
    }
}

/// Fetch up to `pages` consecutive pages from the top of the list.
async fn fetch_pages(
    remote: &dyn TaskRemote,
    limit: usize,
    pages: usize,
) -> std::result::Result<Vec<TaskPage>, MutationError> {
    let mut fetched: Vec<TaskPage> = Vec::with_capacity(pages);
    let mut cursor: Option<TaskCursor> = None;

    for _ in 0..pages.max(1) {
        let page = remote.fetch_page(limit, cursor.as_ref()).await?;
        cursor = page.next_cursor.clone();
        fetched.push(page);
        if cursor.is_none() {
            break;
        }
    }
    Ok(fetched)
}
