//! Thread-affine scheduling
//!
//! Render and simulation state may only be mutated on one thread, the
//! state-owning thread. Commands arrive on any thread, so mutations are sent as
//! tasks over a single-consumer channel and run by the owner in submission
//! order.
//!
//! ```text
//! command thread ──► TaskSender ──► channel ──► state-owning thread
//!                        │                          │
//!                        ◄──────── Completion ◄─────┘
//! ```
//!
//! Two ways to own the queue:
//! - [`TaskQueue`]: the host's own frame loop calls [`TaskQueue::run_pending`]
//! - [`StateThread`]: a dedicated thread blocks on the queue until shutdown
//!
//! Tasks are neither cancellable nor time-limited.

use std::io;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

/// Unit of work for the state-owning thread
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Scheduling errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("State-owning thread is no longer accepting tasks")]
    Disconnected,

    #[error("Scheduled task was dropped before it completed")]
    TaskAbandoned,
}

/// Runs work on the state-owning thread
pub trait ThreadAffineScheduler: Send + Sync {
    /// Queue a task. Returns immediately; use the [`Completion`] to wait.
    fn schedule(&self, task: Task) -> Result<Completion, SchedulerError>;

    /// Whether the calling thread is the state-owning thread
    fn is_owner_thread(&self) -> bool;
}

/// Handle to a scheduled task
#[derive(Debug)]
#[must_use = "dropping a Completion does not cancel the task"]
pub struct Completion {
    done: Option<Receiver<()>>,
}

impl Completion {
    /// An already-finished task
    pub fn ready() -> Self {
        Self { done: None }
    }

    /// Block until the task has run
    pub fn wait(self) -> Result<(), SchedulerError> {
        match self.done {
            None => Ok(()),
            Some(done) => done.recv().map_err(|_| SchedulerError::TaskAbandoned),
        }
    }
}

enum Message {
    Run { task: Task, done: Sender<()> },
    Flush(Sender<()>),
    Shutdown,
}

fn handle(message: Message) -> ControlFlow<()> {
    match message {
        Message::Run { task, done } => {
            match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(()) => {
                    let _ = done.send(());
                }
                Err(_) => {
                    // `done` is dropped, waiters observe TaskAbandoned
                    log::error!("Task panicked on state-owning thread (thread continues)");
                }
            }
            ControlFlow::Continue(())
        }
        Message::Flush(done) => {
            let _ = done.send(());
            ControlFlow::Continue(())
        }
        Message::Shutdown => ControlFlow::Break(()),
    }
}

/// Sending side of a task queue
#[derive(Clone)]
pub struct TaskSender {
    sender: Sender<Message>,
    owner: ThreadId,
}

impl TaskSender {
    /// Thread tasks run on
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Block until every task submitted before this call has run.
    ///
    /// No-op when called on the owning thread.
    pub fn flush(&self) -> Result<(), SchedulerError> {
        if self.is_owner_thread() {
            return Ok(());
        }
        let (done, wait) = bounded(1);
        self.sender
            .send(Message::Flush(done))
            .map_err(|_| SchedulerError::Disconnected)?;
        wait.recv().map_err(|_| SchedulerError::Disconnected)
    }

    /// Ask the owning loop to stop once the tasks queued before this call have run
    pub fn request_shutdown(&self) {
        let _ = self.sender.send(Message::Shutdown);
    }
}

impl ThreadAffineScheduler for TaskSender {
    fn schedule(&self, task: Task) -> Result<Completion, SchedulerError> {
        if self.is_owner_thread() {
            task();
            return Ok(Completion::ready());
        }

        let (done, wait) = bounded(1);
        self.sender
            .send(Message::Run { task, done })
            .map_err(|_| {
                log::warn!("Failed to schedule task: state-owning thread is gone");
                SchedulerError::Disconnected
            })?;
        Ok(Completion { done: Some(wait) })
    }

    fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }
}

/// Task queue drained by a host-driven loop on the owning thread
pub struct TaskQueue {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    owner: ThreadId,
}

impl TaskQueue {
    /// Create a queue owned by the calling thread
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            owner: thread::current().id(),
        }
    }

    /// Sending handle for other threads
    pub fn sender(&self) -> TaskSender {
        TaskSender {
            sender: self.sender.clone(),
            owner: self.owner,
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Number of queued messages
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Run everything queued so far without blocking. Returns the number of
    /// messages handled; stops early on shutdown.
    pub fn run_pending(&self) -> usize {
        debug_assert_eq!(thread::current().id(), self.owner, "run_pending off the owning thread");

        let mut handled = 0;
        while let Ok(message) = self.receiver.try_recv() {
            handled += 1;
            if handle(message).is_break() {
                break;
            }
        }
        handled
    }

    /// Block handling messages until a shutdown request arrives
    pub fn run_until_shutdown(&self) {
        debug_assert_eq!(thread::current().id(), self.owner, "run_until_shutdown off the owning thread");
        run_loop(&self.receiver);
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn run_loop(receiver: &Receiver<Message>) {
    while let Ok(message) = receiver.recv() {
        if handle(message).is_break() {
            break;
        }
    }
}

/// Dedicated state-owning thread
pub struct StateThread {
    sender: TaskSender,
    join: Option<JoinHandle<()>>,
}

impl StateThread {
    /// Spawn the thread and start handling tasks
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (sender, receiver) = unbounded();

        let join = thread::Builder::new().name(name.clone()).spawn(move || {
            log::debug!("State-owning thread started");
            run_loop(&receiver);
            log::debug!("State-owning thread stopped");
        })?;

        log::info!("Spawned state-owning thread '{}'", name);
        let owner = join.thread().id();
        Ok(Self {
            sender: TaskSender { sender, owner },
            join: Some(join),
        })
    }

    /// Scheduler handle for this thread
    pub fn scheduler(&self) -> TaskSender {
        self.sender.clone()
    }

    pub fn thread_id(&self) -> ThreadId {
        self.sender.owner
    }

    /// Barrier: returns once all previously submitted tasks have run
    pub fn flush(&self) -> Result<(), SchedulerError> {
        self.sender.flush()
    }

    /// Stop after the tasks already queued and join the thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(join) = self.join.take() {
            self.sender.request_shutdown();
            if join.join().is_err() {
                log::error!("State-owning thread terminated abnormally");
            }
        }
    }
}

impl Drop for StateThread {
    fn drop(&mut self) {
        self.stop();
    }
}
