//! Checkout form state and its local validation rules.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use furnistore_core::PaymentMethod;

use super::user::UserProfile;

/// Fields of the checkout form that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    ShippingAddress,
    Phone,
    Email,
    ContactPerson,
    CardNumber,
    ExpiryDate,
    Cvc,
    CardholderName,
}

impl FormField {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShippingAddress => "Shipping address",
            Self::Phone => "Phone number",
            Self::Email => "Email address",
            Self::ContactPerson => "Contact person",
            Self::CardNumber => "Card number",
            Self::ExpiryDate => "Expiry date",
            Self::Cvc => "CVC",
            Self::CardholderName => "Cardholder name",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Local, pre-flight validation failure. Never reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(FormField),
}

impl ValidationError {
    /// The field the user has to fix.
    #[must_use]
    pub const fn field(&self) -> FormField {
        match self {
            Self::MissingField(field) => *field,
        }
    }
}

/// Card details, only required for [`PaymentMethod::CreditCard`].
///
/// Implements `Debug` manually to redact the card number and CVC.
#[derive(Clone)]
pub struct CardFields {
    pub card_number: SecretString,
    /// `MM/YY`.
    pub expiry_date: String,
    pub cvc: SecretString,
    pub cardholder_name: String,
}

impl Default for CardFields {
    fn default() -> Self {
        Self {
            card_number: SecretString::from(""),
            expiry_date: String::new(),
            cvc: SecretString::from(""),
            cardholder_name: String::new(),
        }
    }
}

impl std::fmt::Debug for CardFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardFields")
            .field("card_number", &"[REDACTED]")
            .field("expiry_date", &self.expiry_date)
            .field("cvc", &"[REDACTED]")
            .field("cardholder_name", &self.cardholder_name)
            .finish()
    }
}

/// Test cards accepted by the payment sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCard {
    pub number: &'static str,
    pub expiry: &'static str,
    pub cvc: &'static str,
    pub name: &'static str,
}

impl TestCard {
    pub const VISA: Self = Self {
        number: "4242424242424242",
        expiry: "12/25",
        cvc: "123",
        name: "Test User",
    };
    pub const VISA_DEBIT: Self = Self {
        number: "4000056655665556",
        expiry: "12/25",
        cvc: "123",
        name: "Test User",
    };
    pub const MASTERCARD: Self = Self {
        number: "5555555555554444",
        expiry: "12/25",
        cvc: "123",
        name: "Test User",
    };
    pub const AMEX: Self = Self {
        number: "378282246310005",
        expiry: "12/25",
        cvc: "1234",
        name: "Test User",
    };

    /// Card used by [`CheckoutForm::fill_test_card`].
    pub const DEFAULT: Self = Self::VISA;
}

impl From<TestCard> for CardFields {
    fn from(card: TestCard) -> Self {
        Self {
            card_number: SecretString::from(card.number),
            expiry_date: card.expiry.to_string(),
            cvc: SecretString::from(card.cvc),
            cardholder_name: card.name.to_string(),
        }
    }
}

/// The checkout form the user fills in.
///
/// Created when checkout is opened and discarded when it is submitted
/// successfully or cancelled.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub shipping_address: String,
    /// Optional; blank means "same as shipping".
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    pub card: CardFields,
}

impl CheckoutForm {
    /// A new form pre-filled from the user's profile, if one is available.
    ///
    /// The contact person is "last first", skipping blank name parts.
    #[must_use]
    pub fn prefilled(profile: Option<&UserProfile>) -> Self {
        let mut form = Self::default();
        let Some(profile) = profile else {
            return form;
        };

        if let Some(address) = non_blank(profile.address.as_deref()) {
            form.shipping_address = address.to_string();
        }
        if let Some(phone) = non_blank(profile.phone.as_deref()) {
            form.phone = phone.to_string();
        }
        if let Some(email) = non_blank(profile.email.as_deref()) {
            form.email = email.to_string();
        }

        let contact_person = [profile.last_name.as_deref(), profile.first_name.as_deref()]
            .into_iter()
            .filter_map(non_blank)
            .collect::<Vec<_>>()
            .join(" ");
        if !contact_person.is_empty() {
            form.contact_person = contact_person;
        }

        form
    }

    /// Fill the card fields with the default sandbox test card.
    pub fn fill_test_card(&mut self) {
        self.card = CardFields::from(TestCard::DEFAULT);
    }

    /// Billing address to submit: shipping address when billing is blank.
    #[must_use]
    pub fn billing_address_or_shipping(&self) -> &str {
        if self.billing_address.trim().is_empty() {
            &self.shipping_address
        } else {
            &self.billing_address
        }
    }

    /// Check the pre-flight rules, reporting the first missing field.
    ///
    /// Card fields are only checked when paying by credit card.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for the first blank required field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            (FormField::ShippingAddress, self.shipping_address.as_str()),
            (FormField::Phone, self.phone.as_str()),
            (FormField::Email, self.email.as_str()),
            (FormField::ContactPerson, self.contact_person.as_str()),
        ];
        check_filled(&required)?;

        if self.payment_method.is_card() {
            let card = [
                (FormField::CardNumber, self.card.card_number.expose_secret()),
                (FormField::ExpiryDate, self.card.expiry_date.as_str()),
                (FormField::Cvc, self.card.cvc.expose_secret()),
                (FormField::CardholderName, self.card.cardholder_name.as_str()),
            ];
            check_filled(&card)?;
        }

        Ok(())
    }
}

fn check_filled(fields: &[(FormField, &str)]) -> Result<(), ValidationError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(ValidationError::MissingField(*field)),
        None => Ok(()),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A form that passes validation for the given payment method.
    pub(crate) fn valid_form(payment_method: PaymentMethod) -> CheckoutForm {
        let mut form = CheckoutForm {
            contact_person: "Chan Tai Man".to_string(),
            phone: "91234567".to_string(),
            email: "taiman@example.com".to_string(),
            shipping_address: "1 Queen's Road Central, Hong Kong".to_string(),
            billing_address: String::new(),
            payment_method,
            card: CardFields::default(),
        };
        if payment_method.is_card() {
            form.fill_test_card();
        }
        form
    }

    #[test]
    fn test_valid_card_form_passes() {
        assert_eq!(valid_form(PaymentMethod::CreditCard).validate(), Ok(()));
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let mut form = valid_form(PaymentMethod::CreditCard);
        form.phone = "   ".to_string();
        form.contact_person = String::new();
        assert_eq!(
            form.validate(),
            Err(ValidationError::MissingField(FormField::Phone))
        );

        let form = CheckoutForm {
            email: "x@example.com".to_string(),
            ..CheckoutForm::default()
        };
        assert_eq!(
            form.validate().map_err(|e| e.field()),
            Err(FormField::ShippingAddress)
        );
    }

    #[test]
    fn test_card_fields_required_only_for_credit_card() {
        let mut form = valid_form(PaymentMethod::CreditCard);
        form.card.cvc = SecretString::from("");
        assert_eq!(
            form.validate(),
            Err(ValidationError::MissingField(FormField::Cvc))
        );

        let mut form = valid_form(PaymentMethod::WechatPay);
        form.card = CardFields::default();
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn test_validation_message() {
        let err = ValidationError::MissingField(FormField::ShippingAddress);
        assert_eq!(err.to_string(), "Shipping address is required");
    }

    #[test]
    fn test_billing_defaults_to_shipping() {
        let mut form = valid_form(PaymentMethod::AlipayHk);
        assert_eq!(form.billing_address_or_shipping(), form.shipping_address);
        form.billing_address = "PO Box 1".to_string();
        assert_eq!(form.billing_address_or_shipping(), "PO Box 1");
    }

    #[test]
    fn test_prefill_from_profile() {
        let profile = UserProfile {
            username: Some("taiman".to_string()),
            first_name: Some("Tai Man".to_string()),
            last_name: Some("Chan".to_string()),
            email: Some("taiman@example.com".to_string()),
            phone: Some(" ".to_string()),
            address: Some("1 Queen's Road Central".to_string()),
        };

        let form = CheckoutForm::prefilled(Some(&profile));
        assert_eq!(form.contact_person, "Chan Tai Man");
        assert_eq!(form.shipping_address, "1 Queen's Road Central");
        assert_eq!(form.email, "taiman@example.com");
        assert!(form.phone.is_empty());
        assert_eq!(form.payment_method, PaymentMethod::CreditCard);
    }

    #[test]
    fn test_prefill_contact_person_skips_blank_parts() {
        let profile = UserProfile {
            first_name: Some("Mei".to_string()),
            last_name: Some("  ".to_string()),
            ..UserProfile::default()
        };
        assert_eq!(CheckoutForm::prefilled(Some(&profile)).contact_person, "Mei");
        assert!(CheckoutForm::prefilled(None).contact_person.is_empty());
    }

    #[test]
    fn test_card_debug_is_redacted() {
        let mut form = CheckoutForm::default();
        form.fill_test_card();
        let debug_output = format!("{form:?}");
        assert!(!debug_output.contains("4242424242424242"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("12/25"));
    }
}
