use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paylane_core::{PaymentId, TransactionRef};

use crate::request::PaymentRequest;

/// Payment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// No further transitions are expected from a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Refunded
        )
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of processing exactly one [`PaymentRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub transaction_ref: Option<TransactionRef>,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub discount_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PaymentResponse {
    /// A settled response carrying the request's quoted fee.
    pub fn completed(
        request: &PaymentRequest,
        transaction_ref: TransactionRef,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let fees = request.fees();
        Self {
            payment_id: request.id_typed(),
            status: PaymentStatus::Completed,
            transaction_ref: Some(transaction_ref),
            fee: fees.fee,
            net_amount: fees.net_amount,
            discount_amount: fees.discount_amount,
            created_at: request.created_at(),
            completed_at: Some(completed_at),
        }
    }
}
