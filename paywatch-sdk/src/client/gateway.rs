//! Typed HTTP client for the payment gateway API.
//!
//! Every request carries the merchant API key in the `x-api-key` header.
//! The client enforces a local sliding-window request budget and caches
//! payment statuses so that final states never cost a network round trip.

use std::collections::HashMap;

use compact_str::CompactString;
use reqwest::Client;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use super::ClientError;
use crate::limits::{AmountLimits, SupportedCurrencies};
use crate::objects::{CreatePaymentRequest, CurrenciesResponse, EstimateResponse, PaymentResponse};

/// Header carrying the merchant API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Maximum requests per rate-limit window.
const RATE_LIMIT_REQUESTS: u32 = 10;

/// Rate-limit window size in seconds.
const RATE_LIMIT_WINDOW: i64 = 60;

/// How long a non-final cached status may serve as a fallback.
const STALE_STATUS_GRACE: time::Duration = time::Duration::seconds(300);

/// How long the currency list stays cached.
const CURRENCIES_TTL: time::Duration = time::Duration::hours(1);

/// Static configuration for a [`GatewayClient`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Root URL of the gateway API (e.g. `https://api.example.com/v1/`).
    pub base_url: Url,
    /// Merchant API key.
    pub api_key: String,
    /// Deposit bounds in the price currency.
    pub limits: AmountLimits,
    /// Payable cryptocurrencies for this deployment.
    pub currencies: SupportedCurrencies,
    /// Where the gateway should POST payment notifications.
    pub ipn_callback_url: Option<String>,
    /// Where the gateway should send the user after paying.
    pub success_url: Option<String>,
    /// Where the gateway should send the user on abort.
    pub cancel_url: Option<String>,
}

struct CachedStatus {
    response: PaymentResponse,
    fetched_at: time::OffsetDateTime,
}

/// Sliding-window request counter.
///
/// Buckets are `unix_timestamp / window`; a new bucket resets the count.
struct RateWindow {
    bucket: i64,
    count: u32,
}

impl RateWindow {
    fn new() -> Self {
        Self {
            bucket: 0,
            count: 0,
        }
    }

    fn try_acquire(&mut self, bucket: i64) -> bool {
        if bucket != self.bucket {
            self.bucket = bucket;
            self.count = 0;
        }
        if self.count >= RATE_LIMIT_REQUESTS {
            return false;
        }
        self.count += 1;
        true
    }
}

/// Typed HTTP client for the payment gateway.
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
    status_cache: RwLock<HashMap<CompactString, CachedStatus>>,
    currencies_cache: RwLock<Option<(time::OffsetDateTime, CurrenciesResponse)>>,
    rate: Mutex<RateWindow>,
}

impl GatewayClient {
    /// Create a new `GatewayClient` with a 30 second request timeout.
    pub fn new(config: GatewayConfig) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            config,
            status_cache: RwLock::new(HashMap::new()),
            currencies_cache: RwLock::new(None),
            rate: Mutex::new(RateWindow::new()),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// `POST payment` – create a new payment for a fiat deposit.
    ///
    /// `pay_currency` is validated against the configured currency set and
    /// mapped to the gateway identifier before the request is sent.
    pub async fn create_payment(
        &self,
        amount: Decimal,
        price_currency: &str,
        pay_currency: &str,
    ) -> Result<PaymentResponse, ClientError> {
        let amount = self.config.limits.validate(amount)?;
        let code = self.config.currencies.normalize(pay_currency)?;
        let gateway_code = self.config.currencies.pay_currency(&code);
        if gateway_code != code {
            debug!(%code, %gateway_code, "Mapped pay_currency using configured alias");
        }

        let price_currency = price_currency.to_lowercase();
        let request = CreatePaymentRequest {
            price_amount: amount,
            price_currency: CompactString::from(price_currency.as_str()),
            pay_currency: gateway_code,
            ipn_callback_url: self.config.ipn_callback_url.clone(),
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
            order_description: format!(
                "Deposit of {amount} {}",
                price_currency.to_uppercase()
            ),
            is_fee_paid_by_user: true,
        };

        self.acquire_rate_slot().await?;
        let url = self.config.base_url.join("payment")?;
        let resp = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let payment: PaymentResponse = parse_response(resp).await?;

        info!(
            payment_id = %payment.payment_id,
            amount = %amount,
            pay_currency = %code,
            "Created payment"
        );
        Ok(payment)
    }

    /// `GET payment/{payment_id}` – fetch the current payment status.
    ///
    /// Final statuses are served from the cache without a network call.
    /// When a fetch fails and a recent non-final status is cached, the
    /// cached value is returned instead of the error.
    pub async fn payment_status(
        &self,
        payment_id: &str,
    ) -> Result<PaymentResponse, ClientError> {
        {
            let cache = self.status_cache.read().await;
            if let Some(cached) = cache.get(payment_id) {
                if cached.response.payment_status.is_final() {
                    debug!(%payment_id, "Returning cached final status");
                    return Ok(cached.response.clone());
                }
            }
        }

        match self.fetch_payment_status(payment_id).await {
            Ok(payment) => {
                self.store_status(payment_id, &payment).await;
                info!(
                    %payment_id,
                    status = %payment.payment_status,
                    "Fetched payment status"
                );
                Ok(payment)
            }
            Err(e) => {
                let cache = self.status_cache.read().await;
                if let Some(cached) = cache.get(payment_id) {
                    let age = time::OffsetDateTime::now_utc() - cached.fetched_at;
                    if age < STALE_STATUS_GRACE {
                        warn!(
                            %payment_id,
                            error = %e,
                            "Failed to fetch fresh status, returning cached"
                        );
                        return Ok(cached.response.clone());
                    }
                }
                Err(e)
            }
        }
    }

    /// `GET estimate` – estimate the crypto amount for a fiat price.
    pub async fn estimate_price(
        &self,
        amount: Decimal,
        currency_from: &str,
        currency_to: &str,
    ) -> Result<EstimateResponse, ClientError> {
        let amount = self.config.limits.validate(amount)?;
        let code = self.config.currencies.normalize(currency_to)?;

        self.acquire_rate_slot().await?;
        let url = self.config.base_url.join("estimate")?;
        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .query(&[
                ("amount", amount.to_string()),
                ("currency_from", currency_from.to_lowercase()),
                ("currency_to", code.to_string()),
            ])
            .send()
            .await?;

        let estimate: EstimateResponse = parse_response(resp).await?;
        debug!(
            amount = %amount,
            currency_to = %code,
            estimated = %estimate.estimated_amount,
            "Got price estimate"
        );
        Ok(estimate)
    }

    /// `GET currencies` – list every cryptocurrency the gateway accepts.
    ///
    /// Cached for one hour; a stale copy is returned when the refresh fails.
    pub async fn currencies(&self) -> Result<CurrenciesResponse, ClientError> {
        {
            let cache = self.currencies_cache.read().await;
            if let Some((fetched_at, cached)) = cache.as_ref() {
                if time::OffsetDateTime::now_utc() - *fetched_at < CURRENCIES_TTL {
                    return Ok(cached.clone());
                }
            }
        }

        self.acquire_rate_slot().await?;
        let url = self.config.base_url.join("currencies")?;
        let result = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await;
        let fetched: Result<CurrenciesResponse, ClientError> = match result {
            Ok(resp) => parse_response(resp).await,
            Err(e) => Err(e.into()),
        };

        match fetched {
            Ok(currencies) => {
                let mut cache = self.currencies_cache.write().await;
                *cache = Some((time::OffsetDateTime::now_utc(), currencies.clone()));
                info!(count = currencies.currencies.len(), "Refreshed currency list");
                Ok(currencies)
            }
            Err(e) => {
                let cache = self.currencies_cache.read().await;
                if let Some((_, cached)) = cache.as_ref() {
                    warn!(error = %e, "Currency refresh failed, returning cached list");
                    return Ok(cached.clone());
                }
                Err(e)
            }
        }
    }

    /// Cache `payment` under the id the caller queried with. Lookups key
    /// on that id too; the gateway may echo its own spelling of the id in
    /// the response body, so keying on the echoed id would never hit.
    async fn store_status(&self, payment_id: &str, payment: &PaymentResponse) {
        let mut cache = self.status_cache.write().await;
        cache.insert(
            CompactString::from(payment_id),
            CachedStatus {
                response: payment.clone(),
                fetched_at: time::OffsetDateTime::now_utc(),
            },
        );
    }

    async fn fetch_payment_status(
        &self,
        payment_id: &str,
    ) -> Result<PaymentResponse, ClientError> {
        self.acquire_rate_slot().await?;
        let url = self.config.base_url.join(&format!("payment/{payment_id}"))?;
        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        parse_response(resp).await
    }

    async fn acquire_rate_slot(&self) -> Result<(), ClientError> {
        let bucket = time::OffsetDateTime::now_utc().unix_timestamp() / RATE_LIMIT_WINDOW;
        let mut rate = self.rate.lock().await;
        if !rate.try_acquire(bucket) {
            warn!("Gateway request budget exhausted for current window");
            return Err(ClientError::RateLimited);
        }
        Ok(())
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
