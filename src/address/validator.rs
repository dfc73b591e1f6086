use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{AddressField, AddressInput};

static ZIP_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("zip code pattern must compile")
});

#[derive(Clone, Copy, Debug)]
enum Rule {
    MinChars(usize, &'static str),
    MaxChars(usize, &'static str),
    ZipCode(&'static str),
}

impl Rule {
    fn check(self, value: &str) -> Option<&'static str> {
        let passes = match self {
            Rule::MinChars(min, _) => value.chars().count() >= min,
            Rule::MaxChars(max, _) => value.chars().count() <= max,
            Rule::ZipCode(_) => ZIP_CODE.is_match(value),
        };
        if passes {
            return None;
        }
        match self {
            Rule::MinChars(_, message) | Rule::MaxChars(_, message) | Rule::ZipCode(message) => {
                Some(message)
            }
        }
    }
}

const STREET_RULES: &[Rule] = &[
    Rule::MinChars(5, "Street address should be minimum 5 characters"),
    Rule::MaxChars(100, "Street address must be at most 100 characters"),
];
const APARTMENT_RULES: &[Rule] = &[Rule::MaxChars(
    20,
    "Apartment/Suite must be at most 20 characters",
)];
const CITY_RULES: &[Rule] = &[
    Rule::MinChars(1, "City is required"),
    Rule::MaxChars(50, "City must be at most 50 characters"),
];
const STATE_RULES: &[Rule] = &[
    Rule::MinChars(1, "State is required"),
    Rule::MaxChars(50, "State must be at most 50 characters"),
];
const ZIP_CODE_RULES: &[Rule] = &[
    Rule::MinChars(5, "ZIP code must be at least 5 characters"),
    Rule::ZipCode("ZIP code must be 5 digits, optionally followed by a hyphen and 4 digits"),
];
const COUNTRY_RULES: &[Rule] = &[
    Rule::MinChars(1, "Country is required"),
    Rule::MaxChars(56, "Country must be at most 56 characters"),
];

fn rules(field: AddressField) -> &'static [Rule] {
    match field {
        AddressField::Street => STREET_RULES,
        AddressField::Apartment => APARTMENT_RULES,
        AddressField::City => CITY_RULES,
        AddressField::State => STATE_RULES,
        AddressField::ZipCode => ZIP_CODE_RULES,
        AddressField::Country => COUNTRY_RULES,
    }
}

fn value_of(input: &AddressInput, field: AddressField) -> Option<&str> {
    match field {
        AddressField::Street => Some(&input.street),
        AddressField::Apartment => input.apartment.as_deref(),
        AddressField::City => Some(&input.city),
        AddressField::State => Some(&input.state),
        AddressField::ZipCode => Some(&input.zip_code),
        AddressField::Country => Some(&input.country),
    }
}

/// Error messages per field, each list in the order the rules failed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldErrors(BTreeMap<AddressField, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: AddressField, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: AddressField) -> &[String] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first(&self, field: AddressField) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    pub fn contains(&self, field: AddressField) -> bool {
        !self.get(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn fields(&self) -> impl Iterator<Item = AddressField> + '_ {
        self.0
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(field, _)| *field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AddressField, &str)> + '_ {
        self.0.iter().flat_map(|(field, messages)| {
            messages.iter().map(move |message| (*field, message.as_str()))
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationResult {
    Valid(AddressInput),
    Invalid(FieldErrors),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(errors) => Some(errors),
        }
    }
}

/// Checks every field independently; any failure invalidates the whole input.
pub fn validate(input: &AddressInput) -> ValidationResult {
    let mut errors = FieldErrors::new();
    for field in AddressField::ALL {
        let Some(value) = value_of(input, field) else {
            continue;
        };
        for rule in rules(field) {
            if let Some(message) = rule.check(value) {
                errors.push(field, message);
            }
        }
    }

    if !errors.is_empty() {
        return ValidationResult::Invalid(errors);
    }
    ValidationResult::Valid(input.clone().normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_input() -> AddressInput {
        AddressInput {
            street: "123 Main St".into(),
            apartment: None,
            city: "New York".into(),
            state: "NY".into(),
            zip_code: "10001".into(),
            country: "United States".into(),
        }
    }

    #[test]
    fn complete_address_is_valid() {
        assert_eq!(validate(&valid_input()), ValidationResult::Valid(valid_input()));
    }

    #[test]
    fn empty_apartment_is_normalized_away() {
        let input = AddressInput {
            apartment: Some(String::new()),
            ..valid_input()
        };
        assert_eq!(validate(&input), ValidationResult::Valid(valid_input()));
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let input = AddressInput {
            street: "123".into(),
            apartment: None,
            city: String::new(),
            state: "NY".into(),
            zip_code: "abc".into(),
            country: "US".into(),
        };
        let result = validate(&input);
        let errors = result.errors().expect("input must be invalid");
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec![
                AddressField::Street,
                AddressField::City,
                AddressField::ZipCode
            ]
        );
        assert_eq!(
            errors.first(AddressField::Street),
            Some("Street address should be minimum 5 characters")
        );
        assert_eq!(errors.first(AddressField::City), Some("City is required"));
    }

    #[test]
    fn zip_code_messages_follow_rule_order() {
        let input = AddressInput {
            zip_code: "abc".into(),
            ..valid_input()
        };
        let result = validate(&input);
        assert_eq!(
            result.errors().map(|errors| errors.get(AddressField::ZipCode).to_vec()),
            Some(vec![
                "ZIP code must be at least 5 characters".to_owned(),
                "ZIP code must be 5 digits, optionally followed by a hyphen and 4 digits"
                    .to_owned(),
            ])
        );
    }

    #[test]
    fn zip_plus_four_is_accepted() {
        let input = AddressInput {
            zip_code: "10001-1234".into(),
            ..valid_input()
        };
        assert!(validate(&input).is_valid());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let input = AddressInput {
            street: "Ölstr".into(),
            ..valid_input()
        };
        assert!(validate(&input).is_valid());

        let too_long = AddressInput {
            apartment: Some("Ä".repeat(21)),
            ..valid_input()
        };
        assert!(
            validate(&too_long)
                .errors()
                .is_some_and(|errors| errors.contains(AddressField::Apartment))
        );
    }

    proptest! {
        #[test]
        fn short_street_is_always_rejected(street in "\\PC{0,4}") {
            let input = AddressInput { street, ..valid_input() };
            let result = validate(&input);
            prop_assert!(result.errors().is_some_and(|errors| errors.contains(AddressField::Street)));
        }

        #[test]
        fn malformed_zip_is_always_rejected(zip in "\\PC{0,12}") {
            prop_assume!(!ZIP_CODE.is_match(&zip));
            let input = AddressInput { zip_code: zip, ..valid_input() };
            let result = validate(&input);
            prop_assert!(result.errors().is_some_and(|errors| errors.contains(AddressField::ZipCode)));
        }

        #[test]
        fn well_formed_zip_is_always_accepted(zip in "[0-9]{5}(-[0-9]{4})?") {
            let input = AddressInput { zip_code: zip, ..valid_input() };
            prop_assert!(validate(&input).is_valid());
        }

        #[test]
        fn validation_is_idempotent(
            street in "\\PC{0,12}",
            city in "\\PC{0,6}",
            zip in "[0-9a-z-]{0,10}",
        ) {
            let input = AddressInput { street, city, zip_code: zip, ..valid_input() };
            prop_assert_eq!(validate(&input), validate(&input));
        }
    }
}
