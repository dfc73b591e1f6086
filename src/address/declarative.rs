use std::sync::Arc;

use super::validator::{ValidationResult, validate};
use super::{
    AddressEdit, AddressField, AddressFormController, AddressFormState, AddressInput,
    FieldErrors, optional_text,
};
use crate::form::{FieldKey, FormController, FormModel, FormOptions, FormResult, SubmitState};
use crate::submission::SubmissionBackend;

pub const INVALID_FORM_MESSAGE: &str = "Please fix the errors in the form";

/// Address form driven by the generic [`FormController`].
///
/// The submit lifecycle is the controller's state machine; this type only
/// wires the address rules and a backend into it. The previous banner stays
/// visible while a new submission is pending.
pub struct DeclarativeAddressForm<B> {
    form: FormController<AddressInput, String>,
    backend: Arc<B>,
}

impl<B> Clone for DeclarativeAddressForm<B> {
    fn clone(&self) -> Self {
        Self {
            form: self.form.clone(),
            backend: self.backend.clone(),
        }
    }
}

impl<B> DeclarativeAddressForm<B>
where
    B: SubmissionBackend<AddressInput> + 'static,
{
    pub fn new(backend: B) -> FormResult<Self> {
        Self::with_options(
            backend,
            FormOptions {
                invalid_submit_message: Some(INVALID_FORM_MESSAGE.to_owned()),
                ..FormOptions::default()
            },
        )
    }

    pub fn with_options(backend: B, options: FormOptions) -> FormResult<Self> {
        let form = FormController::new(AddressInput::default(), options);
        form.register_form_validator(address_errors)?;
        Ok(Self {
            form,
            backend: Arc::new(backend),
        })
    }

    pub fn controller(&self) -> &FormController<AddressInput, String> {
        &self.form
    }
}

fn address_errors(model: &AddressInput) -> Vec<(FieldKey, String)> {
    match validate(model) {
        ValidationResult::Valid(_) => Vec::new(),
        ValidationResult::Invalid(errors) => errors
            .iter()
            .map(|(field, message)| (field.key(), message.to_owned()))
            .collect(),
    }
}

impl<B> AddressFormController for DeclarativeAddressForm<B>
where
    B: SubmissionBackend<AddressInput> + 'static,
{
    fn edit(&self, edit: AddressEdit) -> FormResult<()> {
        let fields = AddressInput::fields();
        match edit {
            AddressEdit::Street(value) => self.form.set(fields.street(), value),
            AddressEdit::Apartment(value) => {
                self.form.set(fields.apartment(), optional_text(value))
            }
            AddressEdit::City(value) => self.form.set(fields.city(), value),
            AddressEdit::State(value) => self.form.set(fields.state(), value),
            AddressEdit::ZipCode(value) => self.form.set(fields.zip_code(), value),
            AddressEdit::Country(value) => self.form.set(fields.country(), value),
        }
    }

    async fn submit(&self) -> FormResult<SubmitState> {
        let backend = self.backend.clone();
        self.form
            .submit_async(move |model: AddressInput| async move {
                backend.submit(model.normalized()).await
            })
            .await
    }

    fn state(&self) -> FormResult<AddressFormState> {
        let snapshot = self.form.snapshot()?;
        let mut field_errors = FieldErrors::new();
        for (key, errors) in snapshot.field_errors {
            let Some(field) = AddressField::from_key(key) else {
                continue;
            };
            for error in errors {
                field_errors.push(field, error);
            }
        }
        Ok(AddressFormState {
            pending: snapshot.submit_state.is_pending(),
            values: snapshot.model,
            field_errors,
            status: snapshot.submit_state,
            outcome: snapshot.last_outcome,
            submit_count: snapshot.submit_count,
        })
    }
}
