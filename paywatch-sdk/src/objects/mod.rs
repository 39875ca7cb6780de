//! Request and response types for the gateway API.

pub mod payment;
pub mod status;

pub use payment::{
    CreatePaymentRequest, CurrenciesResponse, EstimateResponse, PaymentResponse,
};
pub use status::PaymentState;
