use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Wire format — gateway STK callback JSON
// ---------------------------------------------------------------------------

/// Outermost callback body as delivered by the gateway:
/// `{ "Body": { "stkCallback": { ... } } }`.
///
/// Every level is optional so that an absent envelope is detectable as a
/// malformed payload instead of a blanket deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: Option<CallbackBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: Option<StkCallback>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: String,
    #[serde(rename = "CallbackMetadata")]
    pub callback_metadata: Option<CallbackMetadata>,
}

/// Unordered list of named values; present on success callbacks only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub item: Vec<MetadataItem>,
}

/// One metadata entry. `Value` may be a JSON number (Amount, PhoneNumber)
/// or a string (MpesaReceiptNumber); some entries omit it entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Canonical notification
// ---------------------------------------------------------------------------

/// Canonical, typed form of one gateway callback.
///
/// The correlation ids are carried for future exact-key matching but are not
/// used by the engine today: the store does not retain the gateway's request
/// id at order-creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub result_code: i64,
    pub result_desc: String,
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    /// Present iff `result_code == 0`.
    pub payment: Option<PaymentDetails>,
}

impl Notification {
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }
}

/// Success-path metadata. Fields the gateway omitted hold their sentinel
/// defaults (amount 0, receipt/phone "N/A") rather than failing the whole
/// callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub amount: Decimal,
    pub receipt: String,
    pub phone: String,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(anyhow!("invalid payment status: {}", other)),
        }
    }

    /// Terminal statuses are never reverted (monotonic transition).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// Order record as owned by the store. This subsystem reads orders and
/// applies at most one pending→terminal transition; it never creates or
/// deletes them (creation belongs to the out-of-scope initiation flow).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub total_amount: Decimal,
    /// Locally-formatted convention, e.g. "0702322277" (leading zero rather
    /// than country code). Matched by phone-suffix containment, never
    /// equality.
    pub phone_number: String,
    pub payment_status: PaymentStatus,
    pub mpesa_receipt: Option<String>,
    pub created_at: DateTime<Utc>,
}
