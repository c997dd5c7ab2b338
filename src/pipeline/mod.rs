//! Debounced, cancelable query pipeline
//!
//! Serializes a rapidly-changing search string into a stream of page
//! events. Every query change (re)opens a suppression window; only a query
//! that survives the window untouched starts a page stream, and a change
//! while a stream is live supersedes it. This is last-writer-wins: only
//! the most recently settled query's stream is ever externally observable,
//! and intermediate keystrokes never produce visible fetch activity.
//!
//! Cancellation is a pure data comparison rather than a control-flow
//! interrupt: events carry the generation that produced them and are
//! compared against the current generation at delivery time. A fetch that
//! completes after its query was superseded is dropped, never surfaced —
//! the in-flight I/O itself is not aborted.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::config::PagingConfig;
use crate::errors::CatalogResult;
use crate::models::PageResult;
use crate::repository::CatalogRepository;

/// Tunables for one pipeline instance
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Quiet period a query change must survive before a fetch starts
    pub debounce: Duration,
    /// Pages the driver may fetch ahead of the consumer
    pub event_buffer: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            event_buffer: 2,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(paging: &PagingConfig) -> Self {
        Self {
            debounce: paging.debounce,
            event_buffer: paging.event_buffer,
        }
    }
}

/// One delivered page of the currently settled query
#[derive(Debug)]
pub struct PageEvent {
    /// The settled query this page belongs to
    pub query: String,
    pub page: CatalogResult<PageResult>,
}

enum Command {
    UpdateQuery(String),
    Refresh,
    Shutdown,
}

/// Caller-side control surface of a launched pipeline
///
/// Cloneable; dropping every clone shuts the driver down.
#[derive(Clone)]
pub struct PipelineHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl PipelineHandle {
    /// Submit a new query value
    ///
    /// Distinct-until-changed: re-submitting the current value is a no-op
    /// and does not restart the suppression window.
    pub fn update_query(&self, query: impl Into<String>) {
        let _ = self.commands.send(Command::UpdateQuery(query.into()));
    }

    /// Re-settle the current query immediately, restarting its page stream
    /// from page zero (the caller-level retry affordance)
    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    /// Stop the driver; the event stream ends after draining
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

struct TaggedEvent {
    generation: u64,
    event: PageEvent,
}

/// Consumer side: page events for whichever query is currently settled
///
/// Events from superseded generations are dropped at delivery time and
/// never observed. Ends when the pipeline shuts down.
pub struct PageEvents {
    receiver: mpsc::Receiver<TaggedEvent>,
    current_generation: Arc<AtomicU64>,
}

impl PageEvents {
    /// Receive the next live event, skipping stale ones
    pub async fn recv(&mut self) -> Option<PageEvent> {
        self.next().await
    }
}

impl Stream for PageEvents {
    type Item = PageEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<PageEvent>> {
        loop {
            match self.receiver.poll_recv(cx) {
                Poll::Ready(Some(tagged)) => {
                    if tagged.generation == self.current_generation.load(Ordering::Acquire) {
                        return Poll::Ready(Some(tagged.event));
                    }
                    debug!(
                        generation = tagged.generation,
                        query = %tagged.event.query,
                        "dropped stale page event"
                    );
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// State machine over the current query string
enum State {
    /// No pending change, no live stream
    Idle,
    /// A change occurred; waiting out the suppression window
    Debouncing { pending: String, deadline: Instant },
    /// A page stream is live for the settled query
    Active { worker: JoinHandle<()> },
}

/// Entry point for the debounced query-to-page-stream pipeline
pub struct QueryPipeline;

impl QueryPipeline {
    /// Launch the pipeline driver as a background task
    ///
    /// Launch behaves as an update to the empty-string default query: the
    /// trending stream settles after one suppression window with no caller
    /// action.
    pub fn launch(
        repository: Arc<CatalogRepository>,
        options: PipelineOptions,
    ) -> (PipelineHandle, PageEvents) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(options.event_buffer.max(1));
        let generation = Arc::new(AtomicU64::new(0));

        let driver = Driver {
            repository,
            debounce: options.debounce,
            generation: Arc::clone(&generation),
            events: event_tx,
        };
        tokio::spawn(driver.run(command_rx));

        (
            PipelineHandle {
                commands: command_tx,
            },
            PageEvents {
                receiver: event_rx,
                current_generation: generation,
            },
        )
    }
}

struct Driver {
    repository: Arc<CatalogRepository>,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    events: mpsc::Sender<TaggedEvent>,
}

impl Driver {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        // Last submitted query, settled or not; the distinct-until-changed
        // reference point
        let mut effective = String::new();
        let mut state = self.debounce_to(String::new());

        loop {
            let command = match &mut state {
                State::Idle => commands.recv().await,
                State::Debouncing { pending, deadline } => {
                    let pending = pending.clone();
                    let deadline = *deadline;
                    tokio::select! {
                        command = commands.recv() => command,
                        _ = tokio::time::sleep_until(deadline) => {
                            state = State::Active {
                                worker: self.start_stream(pending),
                            };
                            continue;
                        }
                    }
                }
                State::Active { worker } => {
                    tokio::select! {
                        command = commands.recv() => command,
                        _ = worker => {
                            // Natural termination: empty page or error
                            state = State::Idle;
                            continue;
                        }
                    }
                }
            };

            let Some(command) = command else { break };
            match command {
                Command::UpdateQuery(query) => {
                    if query == effective {
                        continue;
                    }
                    effective.clone_from(&query);
                    if matches!(state, State::Active { .. }) {
                        // Stale-mark the live stream right away; its
                        // buffered events must never surface
                        self.generation.fetch_add(1, Ordering::AcqRel);
                    }
                    state = self.debounce_to(query);
                }
                Command::Refresh => {
                    if matches!(state, State::Active { .. }) {
                        self.generation.fetch_add(1, Ordering::AcqRel);
                    }
                    state = State::Active {
                        worker: self.start_stream(effective.clone()),
                    };
                }
                Command::Shutdown => break,
            }
        }

        // Invalidate whatever is still in flight; lingering stream tasks
        // notice and exit on their own
        self.generation.fetch_add(1, Ordering::AcqRel);
        debug!("query pipeline driver stopped");
    }

    fn debounce_to(&self, pending: String) -> State {
        State::Debouncing {
            pending,
            deadline: Instant::now() + self.debounce,
        }
    }

    /// Bump the generation and start streaming pages for a settled query
    fn start_stream(&self, query: String) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(query = %query, generation, "query settled, starting page stream");

        let mut pages = self.repository.page_stream(&query);
        let current = Arc::clone(&self.generation);
        let events = self.events.clone();

        tokio::spawn(async move {
            loop {
                if current.load(Ordering::Acquire) != generation {
                    debug!(query = %query, generation, "page stream superseded");
                    break;
                }
                let Some(page) = pages.next().await else { break };
                let tagged = TaggedEvent {
                    generation,
                    event: PageEvent {
                        query: query.clone(),
                        page,
                    },
                };
                // Bounded channel: blocking here is what keeps the driver
                // from fetching arbitrarily far ahead of the consumer
                if events.send(tagged).await.is_err() {
                    break;
                }
            }
        })
    }
}
