//! Client-side address entry: field validation, a simulated backend call, and
//! two interchangeable form controllers built on them.

pub mod address;
pub mod form;
pub mod submission;

pub use address::{
    AddressEdit, AddressField, AddressFormController, AddressFormState, AddressInput,
    DeclarativeAddressForm, FieldErrors, ManualAddressForm, ValidationResult, validate,
};
pub use submission::{
    SimulatedBackend, SimulatorConfig, SubmissionBackend, SubmissionOutcome,
};
