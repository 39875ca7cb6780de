//! Deposit payment-confirmation core.
//!
//! After a deposit payment is created, the user is shown an address and a
//! QR code while [`poller::DepositPoller`] repeatedly queries the gateway
//! until the payment is confirmed, the attempt budget runs out, or the
//! session is cancelled. Network access goes through the
//! [`transport::Transport`] seam and every side effect goes through the
//! [`presenter::Presenter`] seam, so the state machine itself has no
//! rendering or HTTP dependency.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

pub mod config;
pub mod poller;
pub mod presenter;
pub mod transport;
pub mod utils;
