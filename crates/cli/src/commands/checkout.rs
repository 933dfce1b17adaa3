//! Checkout command.

#![allow(clippy::print_stdout)]

use furnistore_storefront::CheckoutError;
use furnistore_storefront::checkout::CheckoutPhase;
use furnistore_storefront::models::CheckoutForm;
use secrecy::SecretString;

use super::cart::print_cart;
use super::{CliError, Shop};
use crate::CheckoutArgs;

/// Open checkout for the current cart, fill the form and submit it.
///
/// # Errors
///
/// Returns `CliError` if not signed in or the attempt does not commit.
pub async fn run(shop: &Shop, args: &CheckoutArgs) -> Result<(), CliError> {
    shop.require_session()?;
    let orchestrator = &shop.orchestrator;

    let cart = orchestrator.load_cart().await?;
    print_cart(&cart, shop.config.language);

    let profile = match shop.client.fetch_profile().await {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::warn!(error = %e, "Could not load profile, form starts blank");
            None
        }
    };
    if !orchestrator.open_checkout(profile.as_ref()) {
        return Err(CheckoutError::Busy.into());
    }
    orchestrator.update_form(|form| apply_args(form, args));

    let mut phases = orchestrator.subscribe_phase();
    let progress = tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase = *phases.borrow_and_update();
            if phase.is_in_flight() {
                println!("… {phase}");
            } else if phase == (CheckoutPhase::Failed { cart_restored: true }) {
                println!("Your cart has been restored.");
            }
        }
    });

    let result = orchestrator.submit().await;
    progress.abort();
    let receipt = result?;

    println!(
        "Order {} placed, total {} ({})",
        receipt.order.id, receipt.order.total, receipt.order.status
    );
    if let Some(payment) = receipt.payment {
        println!("Payment {} {}", payment.intent_id, payment.status);
    }
    Ok(())
}

/// Copy command-line values over the pre-filled form.
fn apply_args(form: &mut CheckoutForm, args: &CheckoutArgs) {
    form.payment_method = args.method;
    if args.test_card {
        form.fill_test_card();
    }

    let text_fields = [
        (&mut form.contact_person, &args.contact),
        (&mut form.phone, &args.phone),
        (&mut form.email, &args.email),
        (&mut form.shipping_address, &args.shipping),
        (&mut form.billing_address, &args.billing),
        (&mut form.card.expiry_date, &args.expiry),
        (&mut form.card.cardholder_name, &args.cardholder),
    ];
    for (field, value) in text_fields {
        if let Some(value) = value {
            field.clone_from(value);
        }
    }

    if let Some(number) = &args.card_number {
        form.card.card_number = SecretString::from(number.clone());
    }
    if let Some(cvc) = &args.cvc {
        form.card.cvc = SecretString::from(cvc.clone());
    }
}

#[cfg(test)]
mod tests {
    use furnistore_core::PaymentMethod;
    use furnistore_storefront::models::UserProfile;
    use secrecy::ExposeSecret;

    use super::*;

    fn args() -> CheckoutArgs {
        CheckoutArgs {
            method: PaymentMethod::CreditCard,
            test_card: false,
            contact: None,
            phone: None,
            email: None,
            shipping: None,
            billing: None,
            card_number: None,
            expiry: None,
            cvc: None,
            cardholder: None,
        }
    }

    #[test]
    fn test_args_override_profile() {
        let profile = UserProfile {
            first_name: Some("Tai Man".to_string()),
            last_name: Some("Chan".to_string()),
            phone: Some("91234567".to_string()),
            address: Some("1 Queen's Road Central".to_string()),
            ..UserProfile::default()
        };
        let mut form = CheckoutForm::prefilled(Some(&profile));

        apply_args(
            &mut form,
            &CheckoutArgs {
                method: PaymentMethod::WechatPay,
                phone: Some("98765432".to_string()),
                email: Some("chan@example.com".to_string()),
                ..args()
            },
        );

        assert_eq!(form.payment_method, PaymentMethod::WechatPay);
        assert_eq!(form.contact_person, "Chan Tai Man");
        assert_eq!(form.phone, "98765432");
        assert_eq!(form.email, "chan@example.com");
        assert_eq!(form.shipping_address, "1 Queen's Road Central");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_explicit_card_wins_over_test_card() {
        let mut form = CheckoutForm::default();
        apply_args(
            &mut form,
            &CheckoutArgs {
                test_card: true,
                cvc: Some("999".to_string()),
                ..args()
            },
        );

        assert_eq!(form.card.card_number.expose_secret(), "4242424242424242");
        assert_eq!(form.card.cvc.expose_secret(), "999");
        assert_eq!(form.card.cardholder_name, "Test User");
    }
}
