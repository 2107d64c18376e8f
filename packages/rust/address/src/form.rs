//! Address registration form.

use serde::{Deserialize, Serialize};

use contactdesk_shared::{ErrorReason, FieldErrors, ValidationError};

/// First half of a postal code (`123` in `123-4567`).
const ZIP1_MAX: usize = 3;
/// Second half of a postal code.
const ZIP2_MAX: usize = 4;

/// Raw address form values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressFormInput {
    pub zip1: Option<String>,
    pub zip2: Option<String>,
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
}

/// A validated address form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressForm {
    pub zip1: String,
    pub zip2: String,
    pub prefecture: String,
    pub city: String,
    pub street: Option<String>,
}

impl AddressForm {
    /// Full postal code, both halves joined.
    pub fn postal_code(&self) -> String {
        format!("{}{}", self.zip1, self.zip2)
    }

    /// One-line address: prefecture, city and street concatenated.
    pub fn summary(&self) -> String {
        format!(
            "{}{}{}",
            self.prefecture,
            self.city,
            self.street.as_deref().unwrap_or_default()
        )
    }
}

/// Validate an address form, collecting every failure.
pub fn validate_address_form(input: &AddressFormInput) -> Result<AddressForm, FieldErrors> {
    let mut errors = FieldErrors::new();

    let mut check_len = |field: &str, value: Option<&str>, max: usize| {
        if value.is_some_and(|v| v.chars().count() > max) {
            errors.push(ValidationError::new(field, ErrorReason::TooLong));
        }
    };
    check_len("zip1", input.zip1.as_deref(), ZIP1_MAX);
    check_len("zip2", input.zip2.as_deref(), ZIP2_MAX);

    for (field, value) in [("prefecture", &input.prefecture), ("city", &input.city)] {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            errors.push(ValidationError::new(field, ErrorReason::Required));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let owned = |v: &Option<String>| v.clone().unwrap_or_default();
    Ok(AddressForm {
        zip1: owned(&input.zip1),
        zip2: owned(&input.zip2),
        prefecture: owned(&input.prefecture),
        city: owned(&input.city),
        street: input.street.clone().filter(|s| !s.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(zip1: &str, zip2: &str, prefecture: &str, city: &str) -> AddressFormInput {
        AddressFormInput {
            zip1: Some(zip1.into()),
            zip2: Some(zip2.into()),
            prefecture: Some(prefecture.into()),
            city: Some(city.into()),
            street: None,
        }
    }

    #[test]
    fn valid_form_summarizes_address() {
        let mut raw = input("100", "0001", "東京都", "千代田区千代田");
        raw.street = Some("1-1".into());

        let form = validate_address_form(&raw).expect("valid");
        assert_eq!(form.postal_code(), "1000001");
        assert_eq!(form.summary(), "東京都千代田区千代田1-1");
    }

    #[test]
    fn street_is_optional() {
        let form = validate_address_form(&input("100", "0001", "東京都", "千代田区")).unwrap();
        assert_eq!(form.street, None);
        assert_eq!(form.summary(), "東京都千代田区");
    }

    #[test]
    fn overlong_zip_parts_are_rejected() {
        let errors = validate_address_form(&input("1000", "00011", "東京都", "千代田区")).unwrap_err();
        assert_eq!(errors.get("zip1"), Some(&[ErrorReason::TooLong][..]));
        assert_eq!(errors.get("zip2"), Some(&[ErrorReason::TooLong][..]));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn prefecture_and_city_are_required() {
        let errors = validate_address_form(&AddressFormInput::default()).unwrap_err();
        assert_eq!(errors.fields(), vec!["prefecture", "city"]);
    }
}
