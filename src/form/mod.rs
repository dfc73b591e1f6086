mod controller;
mod validation;


pub use address_forms_derive::FormModel;
pub use controller::{
    FieldKey, FormController, FormError, FormId, FormOptions, FormResult, FormSnapshot,
    SubmitState,
};
pub(crate) use controller::{PendingSubmit, read_lock, write_lock};
pub use validation::{FieldLens, FormModel, FormValidator};
