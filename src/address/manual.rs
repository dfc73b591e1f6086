use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use super::validator::{FieldErrors, ValidationResult, validate};
use super::{AddressEdit, AddressFormController, AddressFormState, AddressInput};
use crate::form::{
    FormError, FormId, FormResult, PendingSubmit, SubmitState, read_lock, write_lock,
};
use crate::submission::{SubmissionBackend, SubmissionOutcome};

struct ManualState {
    form_data: AddressInput,
    is_submitting: bool,
    errors: FieldErrors,
    server_response: Option<SubmissionOutcome>,
    status: SubmitState,
    submit_count: u32,
}

/// Address form whose state is changed only by its two handlers.
///
/// Unlike [`super::DeclarativeAddressForm`], the banner is cleared as soon as
/// a submission starts, and field errors stay until a later submit validates.
pub struct ManualAddressForm<B> {
    id: FormId,
    state: Arc<RwLock<ManualState>>,
    backend: Arc<B>,
}

impl<B> Clone for ManualAddressForm<B> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state: self.state.clone(),
            backend: self.backend.clone(),
        }
    }
}

impl<B> ManualAddressForm<B>
where
    B: SubmissionBackend<AddressInput> + 'static,
{
    pub fn new(backend: B) -> Self {
        Self {
            id: FormId::next(),
            state: Arc::new(RwLock::new(ManualState {
                form_data: AddressInput::default(),
                is_submitting: false,
                errors: FieldErrors::new(),
                server_response: None,
                status: SubmitState::Idle,
                submit_count: 0,
            })),
            backend: Arc::new(backend),
        }
    }

    pub fn handle_change(&self, edit: AddressEdit) -> FormResult<()> {
        let mut state = write_lock(&self.state, "applying manual field change")?;
        edit.apply(&mut state.form_data);
        Ok(())
    }

    pub async fn handle_submit(&self) -> FormResult<SubmitState> {
        let (submitted, address) = {
            let mut state = write_lock(&self.state, "starting manual submit")?;
            if state.is_submitting {
                warn!(form = %self.id, "submit rejected, a submission is already in flight");
                return Err(FormError::AlreadySubmitting);
            }
            state.submit_count = state.submit_count.saturating_add(1);
            state.server_response = None;
            let result = validate(&state.form_data);
            match result {
                ValidationResult::Invalid(errors) => {
                    debug!(form = %self.id, "manual submit stopped by validation");
                    state.errors = errors;
                    state.status = SubmitState::Invalid;
                    return Ok(SubmitState::Invalid);
                }
                ValidationResult::Valid(address) => {
                    state.errors = FieldErrors::new();
                    state.is_submitting = true;
                    state.status = SubmitState::Submitting;
                    (state.form_data.clone(), address)
                }
            }
        };
        let pending = PendingSubmit::new(self.id, self.state.clone(), abandon_submit);

        let outcome = self.backend.submit(address).await;

        let mut state = write_lock(&self.state, "finishing manual submit")?;
        state.is_submitting = false;
        let next = if outcome.is_success() {
            SubmitState::Succeeded
        } else {
            SubmitState::Failed
        };
        if next == SubmitState::Succeeded && state.form_data == submitted {
            state.form_data = AddressInput::default();
        }
        state.status = next;
        info!(form = %self.id, outcome = outcome.message(), "submission resolved");
        state.server_response = Some(outcome);
        pending.settled();
        Ok(next)
    }
}

fn abandon_submit(state: &mut ManualState) {
    state.is_submitting = false;
    state.status = SubmitState::Failed;
}

impl<B> AddressFormController for ManualAddressForm<B>
where
    B: SubmissionBackend<AddressInput> + 'static,
{
    fn edit(&self, edit: AddressEdit) -> FormResult<()> {
        self.handle_change(edit)
    }

    async fn submit(&self) -> FormResult<SubmitState> {
        self.handle_submit().await
    }

    fn state(&self) -> FormResult<AddressFormState> {
        let state = read_lock(&self.state, "reading manual form state")?;
        Ok(AddressFormState {
            values: state.form_data.clone(),
            field_errors: state.errors.clone(),
            status: state.status,
            pending: state.is_submitting,
            outcome: state.server_response.clone(),
            submit_count: state.submit_count,
        })
    }
}
