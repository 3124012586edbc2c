use std::error::Error as StdError;
use std::fmt::{self, Display};

use quill_model::{ErrorKind as ModelErrorKind, ModelProviderError};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The model provider failed.
    Provider(ModelErrorKind),
    /// The model finished without producing any text.
    EmptyOutput,
    /// The crew has no task to run.
    NoTasks,
    /// A task index is out of range.
    UnknownTask,
    /// A task names an agent role that is not part of the crew.
    UnknownAgent,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Provider(kind) => write!(f, "{kind}"),
            ErrorKind::EmptyOutput => write!(f, "Model returned no text"),
            ErrorKind::NoTasks => write!(f, "No task to run"),
            ErrorKind::UnknownTask => write!(f, "Unknown task"),
            ErrorKind::UnknownAgent => write!(f, "Unknown agent"),
        }
    }
}

/// Describes why running a crew failed.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
    source: Option<Box<dyn ModelProviderError>>,
}

impl Error {
    pub(crate) fn provider(err: Box<dyn ModelProviderError>) -> Self {
        Self {
            kind: ErrorKind::Provider(err.kind()),
            reason: None,
            source: Some(err),
        }
    }

    pub(crate) fn moderated(reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Provider(ModelErrorKind::Moderated),
            reason: Some(reason.into()),
            source: None,
        }
    }

    pub(crate) fn empty_output() -> Self {
        Self::from_kind(ErrorKind::EmptyOutput)
    }

    pub(crate) fn no_tasks() -> Self {
        Self::from_kind(ErrorKind::NoTasks)
    }

    pub(crate) fn unknown_task(task_idx: usize, task_count: usize) -> Self {
        Self {
            kind: ErrorKind::UnknownTask,
            reason: Some(format!(
                "task index {task_idx} is out of range, the crew has \
                 {task_count} task(s)"
            )),
            source: None,
        }
    }

    pub(crate) fn unknown_agent(role: &str) -> Self {
        Self {
            kind: ErrorKind::UnknownAgent,
            reason: Some(format!("no agent with role `{role}`")),
            source: None,
        }
    }

    #[inline]
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            reason: None,
            source: None,
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<Box<dyn ModelProviderError>> for Error {
    #[inline]
    fn from(err: Box<dyn ModelProviderError>) -> Self {
        Self::provider(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Provider errors carry the service's own message.
        match (&self.source, &self.reason) {
            (Some(source), _) => write!(f, "{source}"),
            (None, Some(reason)) => write!(f, "{}: {reason}", self.kind),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}
