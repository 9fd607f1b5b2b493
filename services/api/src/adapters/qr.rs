//! services/api/src/adapters/qr.rs
//!
//! Simulated payment references: a QR-code image URL whose payload names the
//! order, the amount and the payer. Nothing is ever settled, and any amount
//! the order carries is encoded as is.

use agro_shop_core::ports::{PaymentReferenceService, PortResult};
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

#[derive(Clone)]
pub struct QrPaymentAdapter {
    base: Url,
}

impl QrPaymentAdapter {
    /// `base` is the QR image endpoint, e.g. `https://api.qrserver.com/v1/create-qr-code/`.
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
        })
    }
}

impl PaymentReferenceService for QrPaymentAdapter {
    fn payment_reference(
        &self,
        order_id: Uuid,
        amount: Decimal,
        payer_email: &str,
    ) -> PortResult<String> {
        let payload = format!(
            "paytm://pay?orderId={order_id}&amount={}&email={payer_email}",
            amount.normalize()
        );
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("data", &payload)
            .append_pair("size", "200x200");
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_carries_order_amount_and_payer() {
        let qr = QrPaymentAdapter::new("https://api.qrserver.com/v1/create-qr-code/").unwrap();
        let order_id = Uuid::new_v4();
        let url = qr
            .payment_reference(order_id, Decimal::new(25000, 2), "farmer@example.com")
            .unwrap();

        assert!(url.starts_with("https://api.qrserver.com/v1/create-qr-code/?"));
        assert!(url.contains(&order_id.to_string()));
        assert!(url.contains("250"));
        assert!(!url.contains("250.00"));
        assert!(url.ends_with("size=200x200"));

        let parsed = Url::parse(&url).unwrap();
        let data = parsed
            .query_pairs()
            .find(|(k, _)| k == "data")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(
            data,
            format!("paytm://pay?orderId={order_id}&amount=250&email=farmer@example.com")
        );
    }

    #[test]
    fn negative_amount_is_encoded_as_sent() {
        let qr = QrPaymentAdapter::new("https://api.qrserver.com/v1/create-qr-code/").unwrap();
        let url = qr
            .payment_reference(Uuid::new_v4(), Decimal::new(-5, 0), "farmer@example.com")
            .unwrap();
        assert!(url.contains("amount%3D-5"));
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(QrPaymentAdapter::new("not a url").is_err());
    }
}
