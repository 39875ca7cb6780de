//! Payment creation and lookup types.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::PaymentState;

/// Request payload for creating a new payment.
///
/// `price_amount`/`price_currency` describe the fiat side of the deposit,
/// `pay_currency` the cryptocurrency the user will actually send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub price_amount: Decimal,
    pub price_currency: CompactString,
    pub pay_currency: CompactString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipn_callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    pub order_description: String,
    /// The user covers network fees on top of the quoted amount.
    pub is_fee_paid_by_user: bool,
}

/// Response returned by both the create-payment and payment-status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    /// Gateway-assigned payment identifier.
    pub payment_id: CompactString,
    /// Current payment status.
    pub payment_status: PaymentState,
    /// Address the user must send funds to.
    pub pay_address: String,
    /// Exact crypto amount the user must send.
    pub pay_amount: Decimal,
    /// Fiat amount the payment was created for.
    pub price_amount: Decimal,
    pub price_currency: CompactString,
    pub pay_currency: CompactString,
    /// Crypto amount actually received so far, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actually_paid: Option<Decimal>,
}

/// Response of the price estimation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub estimated_amount: Decimal,
    pub currency_from: CompactString,
    pub currency_to: CompactString,
}

/// Response of the currency listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrenciesResponse {
    pub currencies: Vec<CompactString>,
}
