//! User-facing fallback messages.
//!
//! Used whenever the server did not supply its own explanation.

use furnistore_core::OrderId;

use crate::config::Language;
use crate::models::FormField;

/// Message catalog for one language.
#[derive(Debug)]
pub struct Catalog {
    pub payment_success: &'static str,
    pub order_failed: &'static str,
    pub intent_failed: &'static str,
    pub confirm_failed: &'static str,
    pub cart_update_failed: &'static str,
    pub login_required: &'static str,
    pub busy: &'static str,
    pub not_open: &'static str,
    pub empty_cart: &'static str,
    language: Language,
}

static EN: Catalog = Catalog {
    payment_success: "Payment successful!",
    order_failed: "Failed to create order",
    intent_failed: "Failed to create payment intent",
    confirm_failed: "Payment confirmation failed",
    cart_update_failed: "Failed to update cart",
    login_required: "Please log in to continue",
    busy: "Your order is already being processed",
    not_open: "Checkout is not open",
    empty_cart: "Your cart is empty",
    language: Language::En,
};

static ZH_HANT: Catalog = Catalog {
    payment_success: "付款成功！",
    order_failed: "建立訂單失敗",
    intent_failed: "建立付款失敗",
    confirm_failed: "付款確認失敗",
    cart_update_failed: "更新購物車失敗",
    login_required: "請先登入",
    busy: "訂單正在處理中",
    not_open: "結帳尚未開始",
    empty_cart: "購物車是空的",
    language: Language::ZhHant,
};

/// The catalog for `language`.
#[must_use]
pub const fn catalog(language: Language) -> &'static Catalog {
    match language {
        Language::En => &EN,
        Language::ZhHant => &ZH_HANT,
    }
}

impl Catalog {
    /// Success notification for a committed checkout.
    #[must_use]
    pub fn order_confirmed(&self, order_id: OrderId) -> String {
        match self.language {
            Language::En => format!("{} Order ID: {order_id}", self.payment_success),
            Language::ZhHant => format!("{}訂單編號：{order_id}", self.payment_success),
        }
    }

    /// "Field is required" for a form field.
    #[must_use]
    pub fn field_required(&self, field: FormField) -> String {
        match self.language {
            Language::En => format!("{} is required", field.label()),
            Language::ZhHant => format!("請填寫{}", field_label_zh(field)),
        }
    }
}

const fn field_label_zh(field: FormField) -> &'static str {
    match field {
        FormField::ShippingAddress => "送貨地址",
        FormField::Phone => "電話號碼",
        FormField::Email => "電郵地址",
        FormField::ContactPerson => "聯絡人",
        FormField::CardNumber => "卡號",
        FormField::ExpiryDate => "到期日",
        FormField::Cvc => "CVC",
        FormField::CardholderName => "持卡人姓名",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_confirmed() {
        let id = OrderId::new(1000);
        assert_eq!(
            catalog(Language::En).order_confirmed(id),
            "Payment successful! Order ID: 1000"
        );
        assert_eq!(
            catalog(Language::ZhHant).order_confirmed(id),
            "付款成功！訂單編號：1000"
        );
    }

    #[test]
    fn test_field_required() {
        assert_eq!(
            catalog(Language::En).field_required(FormField::Email),
            "Email address is required"
        );
        assert_eq!(
            catalog(Language::ZhHant).field_required(FormField::Email),
            "請填寫電郵地址"
        );
    }
}
