//! Classification of storage failures into API errors.
//!
//! Storage failures reach the API in different shapes. A typed
//! [`StoreError::Constraint`] is recognised directly. Other failures may hide
//! a constraint breach somewhere in their [`source`](std::error::Error::source)
//! chain, so the classifier walks that chain, looking at no more than
//! `max_depth` failures. Anything it does not recognise in that window is an
//! internal error.

use std::error::Error as StdError;
use std::fmt;

use crate::api::ApiError;
use crate::models::ValidationError;
use crate::store::{ConstraintViolation, StoreError};

/// Default number of failures examined, counting the top-level one.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Predicate recognising one representation of a constraint violation.
pub type Recognizer = fn(&(dyn StdError + 'static)) -> bool;

fn is<E: StdError + 'static>(error: &(dyn StdError + 'static)) -> bool {
    error.is::<E>()
}

fn is_store_constraint(error: &(dyn StdError + 'static)) -> bool {
    error
        .downcast_ref::<StoreError>()
        .is_some_and(StoreError::is_constraint_violation)
}

/// Maps storage failures to [`ApiError::ConstraintViolation`] or
/// [`ApiError::Internal`].
#[derive(Clone)]
pub struct ErrorClassifier {
    max_depth: usize,
    recognizers: Vec<Recognizer>,
}

impl fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("max_depth", &self.max_depth)
            .field("recognizers", &self.recognizers.len())
            .finish()
    }
}

impl Default for ErrorClassifier {
    /// Depth [`DEFAULT_MAX_DEPTH`], recognising [`StoreError::Constraint`],
    /// [`ConstraintViolation`] and [`ValidationError`].
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
            .recognize_with(is_store_constraint)
            .recognize::<ConstraintViolation>()
            .recognize::<ValidationError>()
    }
}

impl ErrorClassifier {
    /// A classifier that recognises nothing yet.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            recognizers: Vec::new(),
        }
    }

    /// Treat any failure of type `E` as a constraint violation.
    #[must_use]
    pub fn recognize<E: StdError + 'static>(self) -> Self {
        self.recognize_with(is::<E>)
    }

    /// Treat any failure matching `recognizer` as a constraint violation.
    #[must_use]
    pub fn recognize_with(mut self, recognizer: Recognizer) -> Self {
        self.recognizers.push(recognizer);
        self
    }

    /// How many failures the walk examines at most.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Classify a failure returned by the store.
    pub fn classify_store(&self, failure: &StoreError) -> ApiError {
        if failure.is_constraint_violation() {
            return ApiError::ConstraintViolation;
        }
        self.classify(failure)
    }

    /// Classify an arbitrary failure by walking its cause chain.
    pub fn classify(&self, failure: &(dyn StdError + 'static)) -> ApiError {
        match self.find_constraint(failure) {
            Some(depth) => {
                tracing::debug!(depth, "constraint violation found in cause chain");
                ApiError::ConstraintViolation
            }
            None => ApiError::Internal,
        }
    }

    /// Depth (1-based) of the first recognised cause within the bound.
    fn find_constraint(&self, failure: &(dyn StdError + 'static)) -> Option<usize> {
        let mut cause = Some(failure);
        for depth in 1..=self.max_depth {
            let current = cause?;
            if self.recognizers.iter().any(|recognize| recognize(current)) {
                return Some(depth);
            }
            cause = current.source();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use thiserror::Error;

    use super::*;
    use crate::models::FieldViolation;

    #[derive(Debug, Error)]
    #[error("layer {layer}")]
    struct Layer {
        layer: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    }

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct ConnectionReset;

    /// Wrap `root` so that it sits at `depth` (1 = `root` itself).
    fn chain(
        root: Box<dyn StdError + Send + Sync>,
        depth: usize,
    ) -> Box<dyn StdError + Send + Sync> {
        (1..depth).fold(root, |source, layer| -> Box<dyn StdError + Send + Sync> {
            Box::new(Layer { layer, source })
        })
    }

    fn validation_error() -> Box<dyn StdError + Send + Sync> {
        Box::new(ValidationError {
            violations: vec![FieldViolation {
                field: "title",
                message: "too long".to_string(),
            }],
        })
    }

    fn constraint() -> Box<dyn StdError + Send + Sync> {
        Box::new(ConstraintViolation {
            constraint: "unique",
            message: "duplicate".to_string(),
        })
    }

    #[test]
    fn test_marker_within_bound_is_constraint_violation() {
        let classifier = ErrorClassifier::default();

        for depth in 1..=DEFAULT_MAX_DEPTH {
            let failure = chain(validation_error(), depth);
            assert_eq!(
                classifier.classify(&*failure),
                ApiError::ConstraintViolation,
                "depth {depth}"
            );
        }
    }

    #[test]
    fn test_marker_beyond_bound_is_internal() {
        let classifier = ErrorClassifier::default();

        for depth in [DEFAULT_MAX_DEPTH + 1, DEFAULT_MAX_DEPTH + 10] {
            let failure = chain(constraint(), depth);
            assert_eq!(classifier.classify(&*failure), ApiError::Internal);
        }
    }

    #[test]
    fn test_unrecognised_chain_is_internal() {
        let classifier = ErrorClassifier::default();
        let failure = chain(Box::new(ConnectionReset), 3);

        assert_eq!(classifier.classify(&*failure), ApiError::Internal);
    }

    #[test]
    fn test_every_representation_is_recognised() {
        let classifier = ErrorClassifier::default();
        let wrapped_store: Box<dyn StdError + Send + Sync> = Box::new(StoreError::Constraint(
            ConstraintViolation {
                constraint: "unique",
                message: "duplicate".to_string(),
            },
        ));

        for root in [validation_error(), constraint(), wrapped_store] {
            let failure = chain(root, 2);
            assert_eq!(
                classifier.classify(&*failure),
                ApiError::ConstraintViolation
            );
        }
    }

    #[test]
    fn test_typed_store_constraint_skips_walk() {
        let classifier = ErrorClassifier::new(0);
        let failure = StoreError::Constraint(ConstraintViolation {
            constraint: "unique",
            message: "duplicate".to_string(),
        });

        assert_eq!(
            classifier.classify_store(&failure),
            ApiError::ConstraintViolation
        );
    }

    #[test]
    fn test_rolled_back_validation_is_found_through_store_error() {
        let classifier = ErrorClassifier::default();
        let failure = StoreError::rolled_back(chain(validation_error(), 3));

        assert_eq!(
            classifier.classify_store(&failure),
            ApiError::ConstraintViolation
        );
    }

    #[test]
    fn test_unavailable_store_is_internal() {
        let classifier = ErrorClassifier::default();
        let failure = StoreError::Unavailable("disk on fire".to_string());

        assert_eq!(classifier.classify_store(&failure), ApiError::Internal);
    }

    #[test]
    fn test_custom_recognizer_and_depth() {
        let classifier = ErrorClassifier::new(2).recognize::<ConnectionReset>();

        let shallow = chain(Box::new(ConnectionReset), 2);
        let deep = chain(Box::new(ConnectionReset), 3);
        assert_eq!(
            classifier.classify(&*shallow),
            ApiError::ConstraintViolation
        );
        assert_eq!(classifier.classify(&*deep), ApiError::Internal);
        assert_eq!(
            classifier.classify(&*validation_error()),
            ApiError::Internal
        );
    }
}
