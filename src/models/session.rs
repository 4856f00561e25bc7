//! Session identifiers and the vector-store namespaces they map to.

use uuid::Uuid;

/// Partition of the vector index a query or upsert targets.
///
/// Every upload lands in its own `Session` namespace. `Default` is the store's
/// unnamed namespace: uploads never write there, so unscoped queries cannot see
/// any session's documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    Default,
    Session(String),
}

impl Namespace {
    /// Fresh namespace for a new upload.
    pub fn new_session() -> Self {
        Namespace::Session(Uuid::new_v4().to_string())
    }

    /// Map an optional client-supplied session id. Missing or blank ids select `Default`.
    pub fn from_session_id(session_id: Option<&str>) -> Self {
        match session_id.map(str::trim) {
            Some(id) if !id.is_empty() => Namespace::Session(id.to_string()),
            _ => Namespace::Default,
        }
    }

    /// Wire name of the namespace; the default namespace is the empty string.
    pub fn as_str(&self) -> &str {
        match self {
            Namespace::Default => "",
            Namespace::Session(id) => id,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Namespace::Default)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Namespace::Default => write!(f, "<default>"),
            Namespace::Session(id) => write!(f, "{id}"),
        }
    }
}
