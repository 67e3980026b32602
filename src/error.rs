//! Error types for scraping, dataset preparation and training.

/// All errors produced by the library.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("unexpected page layout at {url}: {field} {detail}")]
    ParseLayoutMismatch {
        url: String,
        field: String,
        detail: String,
    },

    #[error("cannot parse {field} from {raw:?} at {url}")]
    FieldFormat {
        url: String,
        field: String,
        raw: String,
    },

    #[error(
        "inconsistent fight history at {url}: {fighters} fighters, {opponents} opponents, {results} results"
    )]
    ConsistencyViolation {
        url: String,
        fighters: usize,
        opponents: usize,
        results: usize,
    },

    #[error("fighter {name:?} not found in {column} column: {cause}")]
    LookupFailure {
        name: String,
        column: String,
        cause: String,
    },

    #[error("unknown result {raw:?} for {fighter} vs. {opponent}")]
    UnknownResultKind {
        fighter: String,
        opponent: String,
        raw: String,
    },

    #[error("label {label} has only {count} member(s), stratified split needs at least 2")]
    InsufficientStratum { label: i64, count: usize },

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures, HTTP 429 and HTTP 5xx are transient; every other
    /// error is deterministic.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network { .. } => true,
            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let server_error = Error::HttpStatus {
            url: "http://x".to_string(),
            status: 503,
        };
        let throttled = Error::HttpStatus {
            url: "http://x".to_string(),
            status: 429,
        };
        let not_found = Error::HttpStatus {
            url: "http://x".to_string(),
            status: 404,
        };
        assert!(server_error.is_transient());
        assert!(throttled.is_transient());
        assert!(!not_found.is_transient());
        assert!(!Error::InvalidDataset("empty".to_string()).is_transient());
    }

    #[test]
    fn test_lookup_failure_message_names_fighter() {
        let err = Error::LookupFailure {
            name: "Jon Jones".to_string(),
            column: "Fighter".to_string(),
            cause: "dropped due to missing values".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"Jon Jones\""));
        assert!(msg.contains("dropped due to missing values"));
    }
}
