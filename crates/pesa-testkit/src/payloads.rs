use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};

/// Success callback JSON exactly as the gateway delivers it: amount and
/// phone as JSON numbers, receipt as a string, plus the `Balance` /
/// `TransactionDate` items the engine ignores.
pub fn success_callback(amount: Decimal, phone: &str, receipt: &str) -> Value {
    let amount_v = amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(amount.to_string()));
    let phone_v = phone
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(phone));

    json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29123-312312",
                "CheckoutRequestID": "ws_CO_DMZ_1232123",
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": amount_v },
                        { "Name": "MpesaReceiptNumber", "Value": receipt },
                        { "Name": "Balance", "Value": 0 },
                        { "Name": "TransactionDate", "Value": 20230514120000u64 },
                        { "Name": "PhoneNumber", "Value": phone_v }
                    ]
                }
            }
        }
    })
}

/// Failure callback: non-zero result code, no metadata.
pub fn failure_callback(code: i64, desc: &str) -> Value {
    json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29123-312312",
                "CheckoutRequestID": "ws_CO_DMZ_1232123",
                "ResultCode": code,
                "ResultDesc": desc
            }
        }
    })
}
