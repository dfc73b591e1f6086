mod declarative;
mod manual;
mod validator;

use std::fmt::{Display, Formatter};
use std::future::Future;

use crate::form::{FieldKey, FormModel, FormResult, SubmitState};
use crate::submission::SubmissionOutcome;

pub use declarative::{DeclarativeAddressForm, INVALID_FORM_MESSAGE};
pub use manual::ManualAddressForm;
pub use validator::{FieldErrors, ValidationResult, validate};

/// Raw values of the address form. An empty apartment is `None`.
#[derive(Clone, Debug, Default, Eq, PartialEq, FormModel)]
pub struct AddressInput {
    pub street: String,
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl AddressInput {
    /// The same values with an empty apartment folded into `None`.
    pub fn normalized(self) -> Self {
        Self {
            apartment: self.apartment.and_then(optional_text),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum AddressField {
    Street,
    Apartment,
    City,
    State,
    ZipCode,
    Country,
}

impl AddressField {
    pub const ALL: [AddressField; 6] = [
        AddressField::Street,
        AddressField::Apartment,
        AddressField::City,
        AddressField::State,
        AddressField::ZipCode,
        AddressField::Country,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AddressField::Street => "street",
            AddressField::Apartment => "apartment",
            AddressField::City => "city",
            AddressField::State => "state",
            AddressField::ZipCode => "zip_code",
            AddressField::Country => "country",
        }
    }

    pub const fn key(self) -> FieldKey {
        FieldKey::new(self.as_str())
    }

    pub fn from_key(key: FieldKey) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    pub const fn is_required(self) -> bool {
        !matches!(self, AddressField::Apartment)
    }
}

impl Display for AddressField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One keystroke's worth of change to a single field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddressEdit {
    Street(String),
    Apartment(String),
    City(String),
    State(String),
    ZipCode(String),
    Country(String),
}

impl AddressEdit {
    pub fn new(field: AddressField, value: impl Into<String>) -> Self {
        let value = value.into();
        match field {
            AddressField::Street => AddressEdit::Street(value),
            AddressField::Apartment => AddressEdit::Apartment(value),
            AddressField::City => AddressEdit::City(value),
            AddressField::State => AddressEdit::State(value),
            AddressField::ZipCode => AddressEdit::ZipCode(value),
            AddressField::Country => AddressEdit::Country(value),
        }
    }

    pub fn field(&self) -> AddressField {
        match self {
            AddressEdit::Street(_) => AddressField::Street,
            AddressEdit::Apartment(_) => AddressField::Apartment,
            AddressEdit::City(_) => AddressField::City,
            AddressEdit::State(_) => AddressField::State,
            AddressEdit::ZipCode(_) => AddressField::ZipCode,
            AddressEdit::Country(_) => AddressField::Country,
        }
    }

    pub fn apply(self, input: &mut AddressInput) {
        match self {
            AddressEdit::Street(value) => input.street = value,
            AddressEdit::Apartment(value) => input.apartment = optional_text(value),
            AddressEdit::City(value) => input.city = value,
            AddressEdit::State(value) => input.state = value,
            AddressEdit::ZipCode(value) => input.zip_code = value,
            AddressEdit::Country(value) => input.country = value,
        }
    }
}

pub(crate) fn optional_text(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// What a view renders for either form variant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AddressFormState {
    pub values: AddressInput,
    pub field_errors: FieldErrors,
    pub status: SubmitState,
    pub pending: bool,
    pub outcome: Option<SubmissionOutcome>,
    pub submit_count: u32,
}

impl AddressFormState {
    pub fn field_error(&self, field: AddressField) -> Option<&str> {
        self.field_errors.first(field)
    }

    pub fn banner(&self) -> Option<&SubmissionOutcome> {
        self.outcome.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        !self.pending
    }
}

/// Shared surface of the declarative and the manual address form.
pub trait AddressFormController {
    fn edit(&self, edit: AddressEdit) -> FormResult<()>;

    /// Validates and, when valid, submits the current values.
    ///
    /// Fails with `FormError::AlreadySubmitting` while a submission is in
    /// flight.
    fn submit(&self) -> impl Future<Output = FormResult<SubmitState>>;

    fn state(&self) -> FormResult<AddressFormState>;
}
