use std::collections::BTreeMap;

use pesa_schemas::{CallbackEnvelope, Notification, PaymentDetails};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

/// Error returned by [`normalize`] when the callback carries no recognizable
/// `Body.stkCallback` envelope.
///
/// This is the one client-visible failure of the subsystem: the caller must
/// reject the delivery (HTTP 400) without touching the store. A malformed
/// envelope never arrives correctly formed on redelivery, so it is
/// non-retryable by definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedPayload {
    pub detail: String,
}

impl std::fmt::Display for MalformedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed callback payload: {}", self.detail)
    }
}

impl std::error::Error for MalformedPayload {}

/// Parse a raw gateway callback into a canonical [`Notification`].
///
/// Envelope validation is strict (`Body.stkCallback` with a result code must
/// be present); metadata extraction is deliberately lenient. On a success
/// result code the three named items are looked up in a name→value map built
/// once per callback, and an absent item falls back to its sentinel
/// (amount 0, receipt "N/A", phone "N/A") — gateways omit fields without
/// invalidating the overall success signal.
///
/// Pure transformation, no side effects.
pub fn normalize(raw: &Value) -> Result<Notification, MalformedPayload> {
    let envelope: CallbackEnvelope =
        serde_json::from_value(raw.clone()).map_err(|e| MalformedPayload {
            detail: format!("unrecognizable callback structure: {e}"),
        })?;

    let cb = envelope
        .body
        .and_then(|b| b.stk_callback)
        .ok_or_else(|| MalformedPayload {
            detail: "missing Body.stkCallback".to_string(),
        })?;

    let payment = if cb.result_code == 0 {
        let items: BTreeMap<&str, &Value> = cb
            .callback_metadata
            .iter()
            .flat_map(|md| md.item.iter())
            .filter_map(|it| it.value.as_ref().map(|v| (it.name.as_str(), v)))
            .collect();

        Some(PaymentDetails {
            amount: items
                .get("Amount")
                .and_then(|v| value_to_decimal(v))
                .unwrap_or(Decimal::ZERO),
            receipt: items
                .get("MpesaReceiptNumber")
                .and_then(|v| value_to_string(v))
                .unwrap_or_else(|| "N/A".to_string()),
            phone: items
                .get("PhoneNumber")
                .and_then(|v| value_to_string(v))
                .unwrap_or_else(|| "N/A".to_string()),
        })
    } else {
        // Failure path: only code and description matter; no metadata
        // extraction occurs.
        None
    };

    Ok(Notification {
        result_code: cb.result_code,
        result_desc: cb.result_desc,
        merchant_request_id: cb.merchant_request_id,
        checkout_request_id: cb.checkout_request_id,
        payment,
    })
}

/// Metadata amounts arrive as JSON numbers ("Amount": 5.0) but some gateways
/// stringify them; accept both.
fn value_to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

/// Phone numbers arrive as JSON numbers ("PhoneNumber": 254702322277);
/// receipts as strings. Render either to its string form.
fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
