//! The network seam between the poller and the payment gateway.
//!
//! [`Transport`] is the only interface the poller talks to; the production
//! implementation [`GatewayTransport`] wraps the SDK client and flattens the
//! gateway's full status taxonomy down to the two states the polling state
//! machine cares about.

use async_trait::async_trait;
use compact_str::CompactString;
use paywatch_sdk::client::{ClientError, GatewayClient};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

/// A user-initiated deposit. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    /// Fiat amount, in the deployment's price currency.
    pub amount: Decimal,
    /// Cryptocurrency code the user wants to pay with.
    pub currency: CompactString,
}

/// Everything the UI needs to show after a payment is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositResult {
    pub payment_id: CompactString,
    /// Address the user must send funds to.
    pub pay_address: String,
    /// Exact crypto amount the user must send.
    pub pay_amount: Decimal,
    /// Rendered QR code for the pay address.
    pub qr_code_url: String,
}

/// Snapshot returned by one status query.
///
/// Carries no memory of prior queries; transient query failure is an `Err`
/// at the transport level, not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
}

/// Errors crossing the transport seam.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP/parse failure talking to the gateway.
    #[error("gateway error: {0}")]
    Gateway(#[from] ClientError),

    /// The gateway rejected the request content; carries the gateway's
    /// own explanation when the error body has one.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Performs the deposit-creation and status-query network calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Create a payment for `request`.
    async fn create_deposit(
        &self,
        request: &DepositRequest,
    ) -> Result<DepositResult, TransportError>;

    /// Query the current status of `payment_id`.
    async fn get_status(&self, payment_id: &str) -> Result<PaymentStatus, TransportError>;
}

/// Production [`Transport`] backed by the SDK's [`GatewayClient`].
pub struct GatewayTransport {
    client: GatewayClient,
    /// Fiat currency deposits are denominated in.
    price_currency: CompactString,
}

impl GatewayTransport {
    pub fn new(client: GatewayClient, price_currency: impl Into<CompactString>) -> Self {
        Self {
            client,
            price_currency: price_currency.into(),
        }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }
}

#[async_trait]
impl Transport for GatewayTransport {
    async fn create_deposit(
        &self,
        request: &DepositRequest,
    ) -> Result<DepositResult, TransportError> {
        let payment = self
            .client
            .create_payment(request.amount, &self.price_currency, &request.currency)
            .await
            .map_err(creation_error)?;

        let qr_code_url = qr_code_url(&payment.pay_address, payment.pay_amount, &request.currency);
        Ok(DepositResult {
            payment_id: payment.payment_id,
            pay_address: payment.pay_address,
            pay_amount: payment.pay_amount,
            qr_code_url,
        })
    }

    async fn get_status(&self, payment_id: &str) -> Result<PaymentStatus, TransportError> {
        let payment = self.client.payment_status(payment_id).await?;
        let status = if payment.payment_status.is_success() {
            PaymentStatus::Completed
        } else {
            // Everything that is not a confirmed success keeps the session
            // in Polling; terminal gateway failures surface to the user as
            // a timeout with a "check back later" message.
            PaymentStatus::Pending
        };
        debug!(%payment_id, gateway_status = %payment.payment_status, ?status, "Mapped payment status");
        Ok(status)
    }
}

/// Classify a creation failure from the client.
///
/// A 4xx answer means the gateway understood and refused the request;
/// its error body carries a `message` field explaining why, which is
/// surfaced as [`TransportError::Rejected`]. Everything else (transport
/// failures, 5xx, local validation) stays a [`TransportError::Gateway`].
fn creation_error(err: ClientError) -> TransportError {
    match err {
        ClientError::Api { status, body } if status.is_client_error() => {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("gateway returned {status}"));
            TransportError::Rejected(message)
        }
        other => TransportError::Gateway(other),
    }
}

/// Build a QR image URL encoding a payment URI for the deposit address.
fn qr_code_url(pay_address: &str, pay_amount: Decimal, currency: &str) -> String {
    let uri = format!("{currency}:{pay_address}?amount={pay_amount}");
    format!(
        "https://api.qrserver.com/v1/create-qr-code/?size=220x220&data={}",
        urlencoding::encode(&uri)
    )
}
