use std::path::PathBuf;

/// Conflicts the store reports when a write would break a uniqueness rule.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error("position {0} is reserved")]
    PositionReserved(u32),

    #[error("user already participates in the queue")]
    AlreadyMember,

    #[error("queue name already exists in this chat")]
    QueueNameTaken,
}

/// Expected, user-facing conditions.
///
/// Handlers return these as values; the dispatcher turns each into a message
/// key for the user. They are never logged as failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("outdated callback")]
    OutdatedCallback,
    #[error("queue no longer exists")]
    QueueDeleted,
    #[error("chat no longer exists")]
    ChatDeleted,
    #[error("queue {0:?} not found")]
    QueueNotFound(String),
    #[error("queue name missing")]
    QueueNameMissing,
    #[error("invalid queue name")]
    InvalidQueueName,
    #[error("queue name too long (max {0})")]
    QueueNameTooLong(usize),
    #[error("queue name already exists")]
    QueueNameTaken,
    #[error("too many queues in chat (max {0})")]
    TooManyQueues(usize),
    #[error("already participates")]
    AlreadyParticipates,
    #[error("does not participate")]
    NotParticipating,
    #[error("position {0} is reserved")]
    PositionReserved(u32),
    #[error("invalid position {0}")]
    InvalidPosition(u32),
    #[error("dynamic queue does not accept explicit positions")]
    DynamicQueuePosition,
    #[error("queue is full (max {0})")]
    QueueFull(usize),
    #[error("no rights")]
    NoRights,
    #[error("group-only command")]
    GroupOnly,
    #[error("cannot swap with yourself")]
    SwapWithSelf,
    #[error("swap proposal is stale (requester now at {0})")]
    SwapStale(u32),
    #[error("requester left the queue")]
    RequesterLeft,
    #[error("target left the queue")]
    TargetLeft,
    #[error("target cannot be reached in private")]
    TargetUnreachable,
}

/// Core error type.
///
/// Adapter crates map their specific errors into this type so the dispatcher
/// can tell user-facing conditions from internal failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("snapshot error: {path}: {reason}")]
    Snapshot { path: PathBuf, reason: String },

    #[error("conflict: {0}")]
    Conflict(#[from] Conflict),

    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("message is not modified")]
    MessageNotModified,

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// The user-facing condition, if this error is one.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Error::Rejected(r) => Some(r.clone()),
            Error::Conflict(Conflict::PositionReserved(p)) => Some(Rejection::PositionReserved(*p)),
            Error::Conflict(Conflict::AlreadyMember) => Some(Rejection::AlreadyParticipates),
            Error::Conflict(Conflict::QueueNameTaken) => Some(Rejection::QueueNameTaken),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
