use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credential is missing or was rejected by the provider.
    Authentication,
    /// The model provider is rate limited, or the quota is exhausted.
    RateLimitExceeded,
    /// The content is moderated.
    Moderated,
    /// The request could not be delivered, or the response could not be
    /// read completely.
    Transport,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Authentication => write!(f, "Authentication error"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::Moderated => write!(f, "Content moderated"),
            ErrorKind::Transport => write!(f, "Transport error"),
            ErrorKind::Other => write!(f, "Model error"),
        }
    }
}
