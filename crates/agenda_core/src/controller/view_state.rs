//! Generic view-state controller.
//!
//! # Responsibility
//! - Hand live collection/record views to the presentation layer.
//! - Queue mutation intents and apply them off the caller's task.
//!
//! # Invariants
//! - Mutations queued through one controller apply in the order they were
//!   queued, one at a time.
//! - Dropping the controller lets already queued mutations finish.
//! - Every failed mutation is logged and published on the failure channel.

use crate::db::{LiveQuery, Persisted};
use crate::model::RecordId;
use crate::repo::{RepoError, RepoResult, Repository};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Failure channel capacity when none is configured.
pub const DEFAULT_FAILURE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// What a successfully applied mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Inserted(RecordId),
    /// `applied == false` when no record had that id.
    Updated { applied: bool },
    /// `applied == false` when no record had that id.
    Deleted { applied: bool },
}

/// Published for every mutation that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub kind: MutationKind,
    pub entity: &'static str,
    /// `0` for failed inserts.
    pub record_id: RecordId,
    pub message: String,
    /// Storage failures may succeed on retry; validation failures will not.
    pub retryable: bool,
}

/// Observer invoked after each successfully applied mutation.
///
/// Runs on the controller's worker task, before the mutation's [`Mutation`]
/// handle resolves. For inserts `record` already carries its assigned id.
pub trait MutationHook<E>: Send + Sync {
    fn after_apply(&self, record: &E, outcome: MutationOutcome);
}

#[derive(Debug)]
pub enum ControllerError {
    /// The worker stopped before reporting a result.
    Closed,
    Repo(RepoError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "controller worker is not running"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Closed => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ControllerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Handle to a queued mutation.
///
/// May be dropped; the mutation still runs and its effect shows up in live
/// queries.
pub struct Mutation {
    reply: oneshot::Receiver<RepoResult<MutationOutcome>>,
}

impl Mutation {
    /// Waits until the worker has applied (or rejected) the mutation.
    pub async fn completed(self) -> Result<MutationOutcome, ControllerError> {
        match self.reply.await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ControllerError::Closed),
        }
    }
}

struct Command<E> {
    kind: MutationKind,
    record: E,
    reply: oneshot::Sender<RepoResult<MutationOutcome>>,
}

/// Presentation-facing adapter over one repository.
///
/// Holds no record state of its own: reads are live views over storage.
pub struct ViewStateController<E: Persisted> {
    repo: Repository<E>,
    commands: mpsc::UnboundedSender<Command<E>>,
    failures: broadcast::Sender<MutationFailure>,
}

impl<E: Persisted> ViewStateController<E> {
    /// Starts a controller and its worker. Must be called inside a Tokio
    /// runtime.
    pub fn new(repo: Repository<E>) -> Self {
        Self::with_hooks(repo, Vec::new(), DEFAULT_FAILURE_CAPACITY)
    }

    /// Starts a controller that notifies `hooks` after each applied mutation.
    pub fn with_hooks(
        repo: Repository<E>,
        hooks: Vec<Arc<dyn MutationHook<E>>>,
        failure_capacity: usize,
    ) -> Self {
        let (commands, queue) = mpsc::unbounded_channel();
        let (failures, _) = broadcast::channel(failure_capacity.max(1));
        tokio::spawn(run_worker(repo.clone(), queue, hooks, failures.clone()));
        Self {
            repo,
            commands,
            failures,
        }
    }

    /// Live list of all records, empty until the first load completes.
    pub fn collection(&self) -> LiveQuery<Vec<E>> {
        self.repo.all()
    }

    /// Live optional record.
    pub fn by_id(&self, id: RecordId) -> LiveQuery<Option<E>> {
        self.repo.by_id(id)
    }

    /// Live list filtered by case-insensitive title/description text.
    pub fn search(&self, text: impl Into<String>) -> LiveQuery<Vec<E>> {
        self.repo.search(text)
    }

    pub fn add(&self, record: E) -> Mutation {
        self.enqueue(MutationKind::Add, record)
    }

    pub fn update(&self, record: E) -> Mutation {
        self.enqueue(MutationKind::Update, record)
    }

    pub fn delete(&self, record: E) -> Mutation {
        self.enqueue(MutationKind::Delete, record)
    }

    /// Subscribes to failures of mutations queued after this call.
    pub fn failures(&self) -> broadcast::Receiver<MutationFailure> {
        self.failures.subscribe()
    }

    pub fn repository(&self) -> &Repository<E> {
        &self.repo
    }

    fn enqueue(&self, kind: MutationKind, record: E) -> Mutation {
        let (reply, receiver) = oneshot::channel();
        let record_id = record.id();
        if self
            .commands
            .send(Command {
                kind,
                record,
                reply,
            })
            .is_err()
        {
            // The dropped reply sender resolves the handle as `Closed`.
            error!(
                "event=controller_enqueue module=controller status=error entity={} op={} id={} error_code=worker_stopped",
                E::KIND,
                kind.as_str(),
                record_id
            );
        }
        Mutation { reply: receiver }
    }
}

async fn run_worker<E: Persisted>(
    repo: Repository<E>,
    mut queue: mpsc::UnboundedReceiver<Command<E>>,
    hooks: Vec<Arc<dyn MutationHook<E>>>,
    failures: broadcast::Sender<MutationFailure>,
) {
    debug!(
        "event=controller_start module=controller status=ok entity={}",
        E::KIND
    );

    while let Some(Command {
        kind,
        mut record,
        reply,
    }) = queue.recv().await
    {
        let result = match kind {
            MutationKind::Add => match repo.add(&record).await {
                Ok(id) => {
                    record.set_id(id);
                    Ok(MutationOutcome::Inserted(id))
                }
                Err(err) => Err(err),
            },
            MutationKind::Update => repo
                .update(&record)
                .await
                .map(|applied| MutationOutcome::Updated { applied }),
            MutationKind::Delete => repo
                .delete(&record)
                .await
                .map(|applied| MutationOutcome::Deleted { applied }),
        };

        match &result {
            Ok(outcome) => {
                for hook in &hooks {
                    hook.after_apply(&record, *outcome);
                }
            }
            Err(err) => {
                error!(
                    "event=controller_mutation module=controller status=error entity={} op={} id={} retryable={} error={}",
                    E::KIND,
                    kind.as_str(),
                    record.id(),
                    err.is_storage_failure(),
                    err
                );
                // No subscribers is fine; the error is still logged and replied.
                let _ = failures.send(MutationFailure {
                    kind,
                    entity: E::KIND,
                    record_id: record.id(),
                    message: err.to_string(),
                    retryable: err.is_storage_failure(),
                });
            }
        }

        let _ = reply.send(result);
    }

    debug!(
        "event=controller_stop module=controller status=ok entity={}",
        E::KIND
    );
}
