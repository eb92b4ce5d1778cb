use std::path::PathBuf;

/// Failure to obtain the page HTML from a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path:?} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode storage: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors crossing the message runtime. Handlers never surface structured
/// errors to the caller; these only describe why a request went unanswered.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("no page context is attached to receive '{0}'")]
    NoReceiver(&'static str),

    #[error("'{0}' is not handled by this context")]
    Unsupported(&'static str),

    #[error("unexpected reply to '{0}'")]
    UnexpectedResponse(&'static str),

    #[error("page could not be read: {0}")]
    Page(#[from] SourceError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("system clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    Write(String),

    #[error("terminal fallback failed: {0}")]
    Terminal(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("'{input}' is not a valid URL: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to open {url} in the browser: {source}")]
    Launch {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Native messaging host failures.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("host IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message of {0} bytes exceeds the {1} byte limit")]
    TooLarge(usize, usize),

    #[error("stream ended inside a frame")]
    Truncated,
}
