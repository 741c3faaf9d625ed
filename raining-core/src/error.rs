use std::fmt;

/// Why a retrieval failed. Callers get the same error type either way; the
/// kind exists for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The daily call ceiling was reached; nothing was sent upstream.
    QuotaExceeded,
    /// The upstream request failed or returned nothing usable.
    Upstream,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::QuotaExceeded => "quota exceeded",
            FailureKind::Upstream => "upstream error",
        })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Could not generate a rain report for coordinates {latitude}, {longitude}: {reason}")]
pub struct RetrievalFailed {
    kind: FailureKind,
    latitude: f64,
    longitude: f64,
    reason: String,
}

impl RetrievalFailed {
    pub fn quota_exceeded(latitude: f64, longitude: f64, call: u64, limit: u64) -> Self {
        Self {
            kind: FailureKind::QuotaExceeded,
            latitude,
            longitude,
            reason: format!(
                "quota exceeded: too many calls to the forecast API in one day, call number {call} (maximum: {limit})"
            ),
        }
    }

    pub fn upstream(latitude: f64, longitude: f64, reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Upstream,
            latitude,
            longitude,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind == FailureKind::QuotaExceeded
    }
}
