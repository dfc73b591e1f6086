use std::collections::BTreeMap;
use std::sync::Arc;

use super::controller::{
    FieldKey, FormController, FormResult, FormValidatorFn, read_lock, write_lock,
};

/// Typed access to one field of a form model.
///
/// Lenses are normally generated by `#[derive(FormModel)]`; the key is the
/// field's name.
pub trait FieldLens<T>: Copy + Send + Sync + 'static {
    type Value: Clone + PartialEq + Send + Sync + 'static;

    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a Self::Value;
    fn set(self, model: &mut T, value: Self::Value);
}

pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    fn fields() -> Self::Fields;
}

/// Whole-model validation reporting any number of errors per field, in order.
pub trait FormValidator<T, E>: Send + Sync {
    fn validate(&self, model: &T) -> Vec<(FieldKey, E)>;
}

impl<T, E, F> FormValidator<T, E> for F
where
    F: Fn(&T) -> Vec<(FieldKey, E)> + Send + Sync,
{
    fn validate(&self, model: &T) -> Vec<(FieldKey, E)> {
        (self)(model)
    }
}

impl<T, E> FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn register_form_validator<V>(&self, validator: V) -> FormResult<()>
    where
        V: FormValidator<T, E> + 'static,
    {
        let validator = Arc::new(validator);
        let wrapped: FormValidatorFn<T, E> = Arc::new(move |model: &T| validator.validate(model));
        write_lock(&self.form_validators, "registering form validator")?.push(wrapped);
        Ok(())
    }

    /// Writes one field. Errors are left alone until the next validation.
    pub fn set<L>(&self, lens: L, value: L::Value) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let mut state = write_lock(&self.state, "writing form model")?;
        lens.set(&mut state.model, value);
        Ok(())
    }

    /// Runs the validators in registration order against the current model and
    /// replaces every field error with the result.
    pub fn validate_form(&self) -> FormResult<bool> {
        let model = read_lock(&self.state, "reading model for form validation")?
            .model
            .clone();
        let validators = read_lock(&self.form_validators, "reading form validators")?.clone();

        let mut field_errors = BTreeMap::<FieldKey, Vec<E>>::new();
        for validator in validators {
            for (key, error) in validator(&model) {
                field_errors.entry(key).or_default().push(error);
            }
        }

        let valid = field_errors.is_empty();
        write_lock(&self.state, "applying form validation result")?.field_errors = field_errors;
        Ok(valid)
    }
}
