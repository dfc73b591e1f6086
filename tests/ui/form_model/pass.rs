use address_forms::form::{FieldLens, FormModel};

#[derive(Clone, address_forms::form::FormModel)]
struct ContactForm {
    name: String,
    postal_code: Option<String>,
}

fn main() {
    let fields = ContactForm::fields();
    let lens = fields.postal_code();
    let mut model = ContactForm {
        name: "Ada".to_string(),
        postal_code: None,
    };
    lens.set(&mut model, Some("10001".to_string()));
    assert_eq!(lens.key().as_str(), "postal_code");
    assert_eq!(lens.get(&model).as_deref(), Some("10001"));
    assert_eq!(fields.name().get(&model), "Ada");
    assert_eq!(fields.keys().len(), 2);
}
