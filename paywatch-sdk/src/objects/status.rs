//! The gateway's payment status taxonomy.

use serde::{Deserialize, Serialize};

/// Every status a gateway payment can report.
///
/// A payment normally moves `waiting → confirming → confirmed → sending →
/// finished`, but can drop into one of the failure states at any point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Payment is waiting for customer funds.
    Waiting,
    /// Payment is being confirmed on the blockchain.
    Confirming,
    /// Payment is confirmed on the blockchain.
    Confirmed,
    /// Payment is being sent to the merchant wallet.
    Sending,
    /// Customer sent less than expected.
    PartiallyPaid,
    /// Payment is successfully processed.
    Finished,
    /// Payment failed.
    Failed,
    /// Payment was refunded.
    Refunded,
    /// Payment expired.
    Expired,
    /// Payment was cancelled.
    Cancelled,
}

impl PaymentState {
    /// Whether the payment has reached a state it will never leave.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            PaymentState::Finished
                | PaymentState::Failed
                | PaymentState::Refunded
                | PaymentState::Expired
                | PaymentState::Cancelled
        )
    }

    /// Whether the payment completed successfully.
    pub fn is_success(self) -> bool {
        matches!(self, PaymentState::Finished)
    }

    /// Whether the payment terminated without the funds arriving.
    pub fn is_failed(self) -> bool {
        matches!(
            self,
            PaymentState::Failed | PaymentState::Expired | PaymentState::Cancelled
        )
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentState::Waiting => "waiting",
            PaymentState::Confirming => "confirming",
            PaymentState::Confirmed => "confirmed",
            PaymentState::Sending => "sending",
            PaymentState::PartiallyPaid => "partially_paid",
            PaymentState::Finished => "finished",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
            PaymentState::Expired => "expired",
            PaymentState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_snake_case() {
        let state: PaymentState = serde_json::from_str("\"partially_paid\"").unwrap();
        assert_eq!(state, PaymentState::PartiallyPaid);
        assert_eq!(
            serde_json::to_string(&PaymentState::Finished).unwrap(),
            "\"finished\""
        );
    }

    #[test]
    fn classifiers() {
        assert!(PaymentState::Finished.is_final());
        assert!(PaymentState::Finished.is_success());
        assert!(!PaymentState::Finished.is_failed());

        assert!(PaymentState::Expired.is_final());
        assert!(PaymentState::Expired.is_failed());

        // Refunded is final but the funds did arrive at some point,
        // so it is not in the failed set.
        assert!(PaymentState::Refunded.is_final());
        assert!(!PaymentState::Refunded.is_failed());

        assert!(!PaymentState::Confirming.is_final());
        assert!(!PaymentState::Confirming.is_success());
        assert!(!PaymentState::PartiallyPaid.is_final());
    }
}
