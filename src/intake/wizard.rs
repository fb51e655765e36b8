//! Intake wizard state machine.
//!
//! Steps advance strictly one at a time and only when the current step's
//! required fields are satisfied. Going back never validates and never loses
//! data. Every transition takes `&self` and returns a new snapshot, so callers
//! can keep or discard states freely.

use serde_json::Value;

use crate::context::{NavigationEvent, SessionContext};
use crate::error::{AuthError, CollaboratorError, DatabaseError, WizardError};
use crate::intake::form::IntakeForm;
use crate::store::RecordId;

/// Where the wizard is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    /// Collecting input.
    Editing,
    /// Insert in flight; every transition is rejected as busy.
    Submitting,
    /// Stored. The draft has been cleared.
    Done { record_id: RecordId },
    /// The last submit failed; the draft is intact and submit may be retried.
    Failed { reason: String },
}

/// Result of `back()`.
#[derive(Debug, Clone)]
pub enum BackOutcome<F: IntakeForm> {
    Moved(Wizard<F>),
    /// Backed out of step 1: the draft is discarded.
    Cancelled,
}

/// A wizard over any `IntakeForm`.
#[derive(Clone)]
pub struct Wizard<F: IntakeForm> {
    ctx: SessionContext,
    step: usize,
    phase: WizardPhase,
    draft: F,
}

impl<F: IntakeForm> std::fmt::Debug for Wizard<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("step", &self.step)
            .field("phase", &self.phase)
            .field("draft", &self.draft)
            .finish()
    }
}

impl<F: IntakeForm> Wizard<F> {
    /// Start at step 1 with an empty draft.
    pub fn new(ctx: SessionContext) -> Self {
        Self::with_prefill(ctx, F::default())
    }

    /// Start at step 1 with a partially filled draft. Nothing is locked.
    pub fn with_prefill(ctx: SessionContext, draft: F) -> Self {
        Self {
            ctx,
            step: 1,
            phase: WizardPhase::Editing,
            draft,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        F::TOTAL_STEPS
    }

    pub fn is_final_step(&self) -> bool {
        self.step == F::TOTAL_STEPS
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn draft(&self) -> &F {
        &self.draft
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        match self.phase {
            WizardPhase::Submitting => Err(WizardError::Busy),
            WizardPhase::Done { .. } => Err(WizardError::Closed),
            WizardPhase::Editing | WizardPhase::Failed { .. } => Ok(()),
        }
    }

    /// Change draft fields. A failed wizard returns to editing.
    pub fn edit(&self, change: impl FnOnce(&mut F)) -> Result<Self, WizardError> {
        self.ensure_open()?;
        let mut next = self.clone();
        change(&mut next.draft);
        next.phase = WizardPhase::Editing;
        Ok(next)
    }

    /// Advance one step once the current step validates. On the final step a
    /// successful check leaves the wizard where it is.
    pub fn next(&self) -> Result<Self, WizardError> {
        self.ensure_open()?;
        self.draft.check_step(self.step)?;
        let mut next = self.clone();
        if next.step < F::TOTAL_STEPS {
            next.step += 1;
        }
        Ok(next)
    }

    /// Go back one step without validating. From step 1 this cancels the
    /// wizard and tells the navigator.
    pub fn back(&self) -> Result<BackOutcome<F>, WizardError> {
        self.ensure_open()?;
        if self.step > 1 {
            let mut prev = self.clone();
            prev.step -= 1;
            return Ok(BackOutcome::Moved(prev));
        }
        tracing::debug!("Wizard cancelled from step 1");
        self.ctx.navigator.navigate(NavigationEvent::Cancelled);
        Ok(BackOutcome::Cancelled)
    }

    /// Enter `Submitting` if the wizard is on its final step and every step validates.
    pub fn begin_submit(&self) -> Result<Self, WizardError> {
        self.ensure_open()?;
        if !self.is_final_step() {
            return Err(WizardError::NotFinalStep {
                step: self.step,
                total: F::TOTAL_STEPS,
            });
        }
        self.draft.check_all()?;
        let mut next = self.clone();
        next.phase = WizardPhase::Submitting;
        Ok(next)
    }

    /// Validate, package and insert the record.
    ///
    /// Validation failures come back as `Err` exactly like `next()`. Once the
    /// insert is attempted the outcome is a snapshot: `Done` (draft cleared,
    /// navigator told) or `Failed` (draft preserved for a retry).
    pub async fn submit(&self) -> Result<Self, WizardError> {
        let submitting = self.begin_submit()?;
        Ok(submitting.complete_submit().await)
    }

    /// Run the insert for a wizard already in `Submitting`.
    pub async fn complete_submit(self) -> Self {
        if self.phase != WizardPhase::Submitting {
            return self;
        }
        match self.insert().await {
            Ok(record_id) => {
                tracing::info!(collection = %F::COLLECTION, id = %record_id, "Intake submitted");
                self.ctx.navigator.navigate(NavigationEvent::Submitted {
                    collection: F::COLLECTION,
                    id: record_id.clone(),
                });
                Self {
                    ctx: self.ctx,
                    step: self.step,
                    phase: WizardPhase::Done { record_id },
                    draft: F::default(),
                }
            }
            Err(err) => {
                tracing::warn!(collection = %F::COLLECTION, "Intake submit failed: {}", err);
                Self {
                    phase: WizardPhase::Failed {
                        reason: err.to_string(),
                    },
                    ..self
                }
            }
        }
    }

    async fn insert(&self) -> Result<RecordId, CollaboratorError> {
        let owner = self.ctx.user.as_ref().ok_or(AuthError::NotSignedIn)?;
        let record = self.draft.to_record(owner).map_err(|e| {
            DatabaseError::Serialization(format!("draft no longer validates: {e}"))
        })?;
        let value: Value = serde_json::to_value(&record)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        Ok(self.ctx.store.insert(F::COLLECTION, value).await?)
    }
}
