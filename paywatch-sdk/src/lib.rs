//! Wire types and HTTP client for the Paywatch payment gateway.
//!
//! The gateway is a NOWPayments-compatible hosted payment API: the
//! application creates a payment, shows the user a deposit address, and
//! then watches the payment status until it reaches a final state.
//!
//! The HTTP client lives behind the `client` cargo feature so downstream
//! crates that only need the shared types do not pull in `reqwest`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

#[cfg(feature = "client")]
pub mod client;
pub mod ipn;
pub mod limits;
pub mod objects;
