use crate::error::OpsError;
use parking_lot::Mutex;

/// Concurrency-safe error sink owned by every backup handle.
///
/// Components writing files concurrently record failures here instead of
/// failing the write call synchronously; `end_backup`/`abort_backup` read
/// the accumulated state to decide commit versus rollback. Append-only:
/// recorded failures are never dropped for the life of the session.
#[derive(Debug, Default)]
pub struct ErrorRecorder {
    errors: Mutex<Vec<OpsError>>,
}

impl ErrorRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure. Safe to call from any number of writers.
    pub fn record(&self, err: OpsError) {
        self.errors.lock().push(err);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.lock().is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }

    /// Aggregates everything recorded so far into a single error, messages
    /// joined in record order. Returns `None` when the session is clean.
    pub fn to_error(&self) -> Option<OpsError> {
        let errors = self.errors.lock();
        if errors.is_empty() {
            return None;
        }
        let detail = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Some(OpsError::RecordedFailures {
            count: errors.len(),
            detail,
        })
    }
}
