//! Shared state for the book API handlers.

use std::fmt;
use std::sync::Arc;

use crate::api::ApiError;
use crate::classify::ErrorClassifier;
use crate::metrics::MetricsSink;
use crate::store::{BookRepository, StoreError};

/// Everything a handler needs, injected at router construction.
///
/// Cheap to clone; clones share the same store, sink and classifier.
#[derive(Clone)]
pub struct AppState {
    books: Arc<dyn BookRepository>,
    metrics: Arc<dyn MetricsSink>,
    classifier: Arc<ErrorClassifier>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create state with the default [`ErrorClassifier`].
    pub fn new(books: Arc<dyn BookRepository>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            books,
            metrics,
            classifier: Arc::new(ErrorClassifier::default()),
        }
    }

    /// Replace the error classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// The book store.
    pub fn books(&self) -> &dyn BookRepository {
        self.books.as_ref()
    }

    /// The metrics sink.
    pub fn metrics(&self) -> &dyn MetricsSink {
        self.metrics.as_ref()
    }

    /// Count a rejected request and hand the error back.
    pub(crate) fn reject(&self, err: ApiError) -> ApiError {
        tracing::debug!(status = %err.status_code(), code = err.code(), "request rejected");
        self.metrics.increment(err.metric());
        err
    }

    /// Classify a store failure, log it with its cause and count it.
    pub(crate) fn fail(&self, err: StoreError) -> ApiError {
        let classified = self.classifier.classify_store(&err);
        match classified {
            ApiError::ConstraintViolation => {
                tracing::warn!(error = %err, "write rejected by store constraint");
            }
            _ => {
                tracing::error!(error = %err, cause = ?std::error::Error::source(&err), "store failure");
            }
        }
        self.reject(classified)
    }
}
