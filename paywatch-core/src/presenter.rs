//! The rendering seam.
//!
//! The poller never touches the UI directly; it reports through this
//! capability set. A page controller implements it with DOM updates,
//! toasts and redirects; headless consumers can use [`TracingPresenter`].

use tracing::{info, warn};

use crate::transport::DepositResult;

/// Side-effect capabilities the poller needs from the UI layer.
pub trait Presenter: Send + Sync {
    /// A payment was created; render the address and QR code.
    fn show_deposit(&self, result: &DepositResult);

    /// Deposit creation failed; the user must resubmit.
    fn show_error(&self, message: &str);

    /// The payment was confirmed. Typically redirects after a short delay.
    fn on_success(&self);

    /// The attempt budget ran out without a confirmation.
    ///
    /// Not an error: the payment may still confirm later, the message
    /// directs the user to check back or contact support.
    fn on_timeout(&self, message: &str);
}

/// Log-only presenter for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn show_deposit(&self, result: &DepositResult) {
        info!(
            payment_id = %result.payment_id,
            pay_address = %result.pay_address,
            pay_amount = %result.pay_amount,
            "Deposit created"
        );
    }

    fn show_error(&self, message: &str) {
        warn!(message, "Deposit failed");
    }

    fn on_success(&self) {
        info!("Payment confirmed");
    }

    fn on_timeout(&self, message: &str) {
        warn!(message, "Payment confirmation timed out");
    }
}
