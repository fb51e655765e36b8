//! The `IntakeForm` trait: what a wizard needs to know about its draft.

use serde::Serialize;

use crate::context::UserId;
use crate::error::ValidationError;
use crate::store::Collection;

/// A draft record collected over a fixed number of ordered steps.
pub trait IntakeForm: Clone + Default + std::fmt::Debug + Send + Sync + 'static {
    /// Record shape handed to the store on submit.
    type Record: Serialize;

    /// Collection the finished record is inserted into.
    const COLLECTION: Collection;

    /// Number of steps; steps are numbered `1..=TOTAL_STEPS`.
    const TOTAL_STEPS: usize;

    /// Check the required fields owned by `step`.
    fn check_step(&self, step: usize) -> Result<(), ValidationError>;

    /// Check every step, reporting all offending fields together.
    fn check_all(&self) -> Result<(), ValidationError> {
        let mut failure: Option<ValidationError> = None;
        for step in 1..=Self::TOTAL_STEPS {
            if let Err(err) = self.check_step(step) {
                failure = Some(match failure {
                    Some(prev) => prev.merge(err),
                    None => err,
                });
            }
        }
        failure.map_or(Ok(()), Err)
    }

    /// Package the draft for `owner`. Fails with the same error `check_all` would.
    fn to_record(&self, owner: &UserId) -> Result<Self::Record, ValidationError>;
}
