use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::submission::SubmissionOutcome;

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "form-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Lifecycle of one submit attempt.
///
/// `Invalid`, `Succeeded` and `Failed` are resting states: the form is idle and
/// accepts a new submission, but remembers how the last attempt ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Invalid,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmitState {
    pub const fn is_pending(self) -> bool {
        matches!(self, SubmitState::Validating | SubmitState::Submitting)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub reset_on_success: bool,
    /// Banner stored as a failure outcome when a submit stops at validation.
    pub invalid_submit_message: Option<String>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            reset_on_success: true,
            invalid_submit_message: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T, E> {
    pub id: FormId,
    pub model: T,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub field_errors: BTreeMap<FieldKey, Vec<E>>,
    pub last_outcome: Option<SubmissionOutcome>,
}

impl<T, E> FormSnapshot<T, E> {
    pub fn is_pending(&self) -> bool {
        self.submit_state.is_pending()
    }

    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("form submit is already in progress")]
    AlreadySubmitting,
}

pub type FormResult<T> = Result<T, FormError>;

pub(super) type FormValidatorFn<T, E> = Arc<dyn Fn(&T) -> Vec<(FieldKey, E)> + Send + Sync>;

pub(super) struct FormState<T, E> {
    pub(super) id: FormId,
    pub(super) initial_model: T,
    pub(super) model: T,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    /// Only fields with at least one error have an entry.
    pub(super) field_errors: BTreeMap<FieldKey, Vec<E>>,
    pub(super) last_outcome: Option<SubmissionOutcome>,
}

/// Lens-addressed form model with registered validators and a guarded submit.
#[derive(Clone)]
pub struct FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<FormState<T, E>>>,
    pub(super) form_validators: Arc<RwLock<Vec<FormValidatorFn<T, E>>>>,
}

impl<T, E> FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T, options: FormOptions) -> Self {
        Self {
            options,
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                initial_model: initial.clone(),
                model: initial,
                submit_state: SubmitState::Idle,
                submit_count: 0,
                field_errors: BTreeMap::new(),
                last_outcome: None,
            })),
            form_validators: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    /// Validates the current model and, if it passes, hands a snapshot of it to
    /// `submit`.
    ///
    /// Returns the resting state the attempt ended in. A second call while one
    /// is validating or in flight fails with [`FormError::AlreadySubmitting`]
    /// and never reaches `submit`. Dropping the returned future before it
    /// resolves leaves the form `Failed`.
    pub async fn submit_async<F, Fut>(&self, submit: F) -> FormResult<SubmitState>
    where
        T: PartialEq,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = SubmissionOutcome>,
    {
        let id = {
            let mut state = write_lock(&self.state, "preparing async submit")?;
            if state.submit_state.is_pending() {
                warn!(form = %state.id, "submit rejected, a submission is already in flight");
                return Err(FormError::AlreadySubmitting);
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
            state.id
        };
        let pending = PendingSubmit::new(id, self.state.clone(), abandon_submit::<T, E>);

        if !self.validate_form()? {
            let mut state = write_lock(&self.state, "handling submit validation failure")?;
            transition_submit_state(&mut state, SubmitState::Invalid)?;
            if let Some(message) = &self.options.invalid_submit_message {
                state.last_outcome = Some(SubmissionOutcome::Failure(message.clone()));
            }
            pending.settled();
            return Ok(SubmitState::Invalid);
        }

        let submitted = {
            let mut state = write_lock(&self.state, "moving submit state to submitting")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            state.model.clone()
        };
        let outcome = submit(submitted.clone()).await;

        let mut state = write_lock(&self.state, "completing async submit")?;
        let next = if outcome.is_success() {
            SubmitState::Succeeded
        } else {
            SubmitState::Failed
        };
        transition_submit_state(&mut state, next)?;
        if outcome.is_success() && self.options.reset_on_success {
            if state.model == submitted {
                state.model = state.initial_model.clone();
                state.field_errors.clear();
            } else {
                debug!(form = %state.id, "form edited while submitting, keeping values");
            }
        }
        info!(form = %state.id, outcome = outcome.message(), "submission resolved");
        state.last_outcome = Some(outcome);
        pending.settled();
        Ok(next)
    }

    /// Restores the initial model and forgets errors and the last outcome.
    ///
    /// Refused while a submission is pending.
    pub fn reset_to_initial(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        transition_submit_state(&mut state, SubmitState::Idle)?;
        state.model = state.initial_model.clone();
        state.field_errors.clear();
        state.last_outcome = None;
        Ok(())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T, E>> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            id: state.id,
            model: state.model.clone(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            field_errors: state.field_errors.clone(),
            last_outcome: state.last_outcome.clone(),
        })
    }
}

fn abandon_submit<T, E>(state: &mut FormState<T, E>) {
    state.submit_state = SubmitState::Failed;
}

pub(super) fn transition_submit_state<T, E>(
    state: &mut FormState<T, E>,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (
            SubmitState::Idle
                | SubmitState::Invalid
                | SubmitState::Succeeded
                | SubmitState::Failed,
            SubmitState::Validating
        ) | (SubmitState::Validating, SubmitState::Invalid)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (
                SubmitState::Invalid | SubmitState::Succeeded | SubmitState::Failed,
                SubmitState::Idle
            )
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    debug!(form = %state.id, from = ?current, to = ?next, "submit state transition");
    state.submit_state = next;
    Ok(())
}

/// Marks a submission as in flight until [`PendingSubmit::settled`] is called.
///
/// If it is dropped first (the submit future was dropped, or an error was
/// propagated out of it), `abandon` puts the state back at rest so the next
/// submit is accepted.
pub(crate) struct PendingSubmit<S> {
    form: FormId,
    state: Arc<RwLock<S>>,
    abandon: fn(&mut S),
    armed: bool,
}

impl<S> PendingSubmit<S> {
    pub(crate) fn new(form: FormId, state: Arc<RwLock<S>>, abandon: fn(&mut S)) -> Self {
        Self {
            form,
            state,
            abandon,
            armed: true,
        }
    }

    pub(crate) fn settled(mut self) {
        self.armed = false;
    }
}

impl<S> Drop for PendingSubmit<S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(form = %self.form, "submission abandoned before it resolved");
        // A poisoned lock still has to be released from the pending state.
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        (self.abandon)(&mut state);
    }
}

pub(crate) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(crate) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
