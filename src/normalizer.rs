/// Defensive normalization of upstream BBPS response envelopes.
///
/// The aggregator returns the same logical payload in several alternative
/// wrappings depending on which backend served the call. Each accepted shape
/// is modeled as one variant of an untagged enum; serde tries the variants in
/// declaration order, which fixes the precedence. Everything collapses to one
/// canonical `{"<responseKey>": {...}}` object so downstream code only ever
/// sees one shape.
///
/// Error text extraction is the same idea: a fixed, ordered list of locations
/// probed by a single pure function. The order determines the user-facing
/// message and must not be rearranged.
use crate::errors::AppError;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Remote operations whose responses pass through the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    BillFetch,
    BillValidation,
    BillerInfo,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::BillFetch => "bill fetch",
            Operation::BillValidation => "bill validation",
            Operation::BillerInfo => "biller info",
        }
    }
}

/// Body carrying a response code and biller response at the same level.
/// `extra` keeps whatever else the backend echoed (request ids included).
#[derive(Debug, Deserialize)]
struct CodedBody {
    #[serde(rename = "responseCode")]
    response_code: Value,
    #[serde(rename = "billerResponse")]
    biller_response: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl CodedBody {
    fn into_inner(self) -> Value {
        let mut inner = Map::new();
        inner.insert("responseCode".to_string(), self.response_code);
        inner.insert("billerResponse".to_string(), self.biller_response);
        for (k, v) in self.extra {
            inner.insert(k, v);
        }
        Value::Object(inner)
    }
}

#[derive(Debug, Deserialize)]
struct KeyedFetch {
    #[serde(rename = "billFetchResponse")]
    bill_fetch_response: Value,
}

/// The four accepted bill-fetch success shapes, in precedence order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BillFetchEnvelope {
    Canonical(KeyedFetch),
    DataCanonical { data: KeyedFetch },
    DataCoded { data: CodedBody },
    BareCoded(CodedBody),
}

#[derive(Debug, Deserialize)]
struct KeyedValidation {
    #[serde(rename = "billValidationResponse")]
    bill_validation_response: Value,
}

/// Accepted bill-validation success shapes, in precedence order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BillValidationEnvelope {
    Canonical(KeyedValidation),
    DataCanonical { data: KeyedValidation },
    DataCoded { data: CodedBody },
    BareCoded(CodedBody),
}

#[derive(Debug, Deserialize)]
struct KeyedBillerInfo {
    #[serde(rename = "billerInfoResponse")]
    biller_info_response: Value,
}

/// Accepted biller-info success shapes, in precedence order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BillerInfoEnvelope {
    Canonical(KeyedBillerInfo),
    DataCanonical { data: KeyedBillerInfo },
}

/// Ordered probe locations for a failure message. The first hit wins.
const ERROR_MESSAGE_RULES: &[&[&str]] = &[
    &["errorMessage"],
    &["data", "errorMessage"],
    &["errorInfo", "errorMessage"],
    &["data", "errorInfo", "errorMessage"],
    &["message"],
    &["responseMessage"],
    &["respReason"],
];

fn lookup_path<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = raw;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Applies the ordered extraction rules and returns the first non-empty
/// string found, falling back to a raw string body. `None` means the payload
/// carries no recognizable message at all.
pub fn try_extract_error_message(raw: &Value) -> Option<String> {
    for path in ERROR_MESSAGE_RULES {
        if let Some(found) = lookup_path(raw, path).and_then(|v| v.as_str()) {
            if !found.trim().is_empty() {
                return Some(found.to_string());
            }
        }
    }
    // A bare string body is its own message.
    if let Some(s) = raw.as_str() {
        if !s.trim().is_empty() {
            return Some(s.to_string());
        }
    }
    None
}

/// User-facing message for a failed remote call, with the generic fallback.
pub fn extract_error_message(raw: &Value) -> String {
    try_extract_error_message(raw).unwrap_or_else(|| "Something went wrong".to_string())
}

fn unrecognized(operation: Operation, raw: &Value) -> AppError {
    match try_extract_error_message(raw) {
        Some(msg) => AppError::RemoteCallError(msg),
        None => AppError::UnrecognizedResponseShape {
            operation: operation.as_str().to_string(),
            raw: raw.clone(),
        },
    }
}

/// Collapses any accepted bill-fetch success shape to the canonical
/// `{"billFetchResponse": {...}}` object. Pure and idempotent.
pub fn normalize_bill_fetch(raw: &Value) -> Result<Value, AppError> {
    match serde_json::from_value::<BillFetchEnvelope>(raw.clone()) {
        Ok(BillFetchEnvelope::Canonical(k)) => {
            Ok(json!({ "billFetchResponse": k.bill_fetch_response }))
        }
        Ok(BillFetchEnvelope::DataCanonical { data }) => {
            Ok(json!({ "billFetchResponse": data.bill_fetch_response }))
        }
        Ok(BillFetchEnvelope::DataCoded { data }) => {
            Ok(json!({ "billFetchResponse": data.into_inner() }))
        }
        Ok(BillFetchEnvelope::BareCoded(body)) => {
            Ok(json!({ "billFetchResponse": body.into_inner() }))
        }
        Err(_) => Err(unrecognized(Operation::BillFetch, raw)),
    }
}

/// Collapses any accepted bill-validation success shape to the canonical
/// `{"billValidationResponse": {...}}` object.
pub fn normalize_bill_validation(raw: &Value) -> Result<Value, AppError> {
    match serde_json::from_value::<BillValidationEnvelope>(raw.clone()) {
        Ok(BillValidationEnvelope::Canonical(k)) => {
            Ok(json!({ "billValidationResponse": k.bill_validation_response }))
        }
        Ok(BillValidationEnvelope::DataCanonical { data }) => {
            Ok(json!({ "billValidationResponse": data.bill_validation_response }))
        }
        Ok(BillValidationEnvelope::DataCoded { data }) => {
            Ok(json!({ "billValidationResponse": data.into_inner() }))
        }
        Ok(BillValidationEnvelope::BareCoded(body)) => {
            Ok(json!({ "billValidationResponse": body.into_inner() }))
        }
        Err(_) => Err(unrecognized(Operation::BillValidation, raw)),
    }
}

/// Collapses a biller-info success shape to the canonical
/// `{"billerInfoResponse": {...}}` object.
pub fn normalize_biller_info(raw: &Value) -> Result<Value, AppError> {
    match serde_json::from_value::<BillerInfoEnvelope>(raw.clone()) {
        Ok(BillerInfoEnvelope::Canonical(k)) => {
            Ok(json!({ "billerInfoResponse": k.biller_info_response }))
        }
        Ok(BillerInfoEnvelope::DataCanonical { data }) => {
            Ok(json!({ "billerInfoResponse": data.biller_info_response }))
        }
        Err(_) => Err(unrecognized(Operation::BillerInfo, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn biller_response() -> Value {
        json!({
            "billAmount": "1450.00",
            "billDate": "2024-05-02",
            "customerName": "RAMESH KUMAR",
            "dueDate": "2024-05-18"
        })
    }

    #[test]
    fn canonical_shape_passes_through() {
        let raw = json!({ "billFetchResponse": biller_response() });
        let out = normalize_bill_fetch(&raw).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn data_wrapped_canonical_unwraps() {
        let raw = json!({ "data": { "billFetchResponse": biller_response() } });
        let out = normalize_bill_fetch(&raw).unwrap();
        assert_eq!(out, json!({ "billFetchResponse": biller_response() }));
    }

    #[test]
    fn data_wrapped_coded_body_becomes_inner_object() {
        let raw = json!({
            "data": { "responseCode": "000", "billerResponse": biller_response() }
        });
        let out = normalize_bill_fetch(&raw).unwrap();
        assert_eq!(
            out,
            json!({
                "billFetchResponse": {
                    "responseCode": "000",
                    "billerResponse": biller_response()
                }
            })
        );
    }

    #[test]
    fn bare_coded_body_matches_data_wrapped_coded() {
        let bare = json!({ "responseCode": "000", "billerResponse": biller_response() });
        let wrapped = json!({
            "data": { "responseCode": "000", "billerResponse": biller_response() }
        });
        assert_eq!(
            normalize_bill_fetch(&bare).unwrap(),
            normalize_bill_fetch(&wrapped).unwrap()
        );
    }

    #[test]
    fn coded_body_keeps_extra_fields() {
        let raw = json!({
            "responseCode": "000",
            "billerResponse": biller_response(),
            "requestId": "REQ123"
        });
        let out = normalize_bill_fetch(&raw).unwrap();
        assert_eq!(out["billFetchResponse"]["requestId"], json!("REQ123"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!({ "responseCode": "000", "billerResponse": biller_response() });
        let once = normalize_bill_fetch(&raw).unwrap();
        let twice = normalize_bill_fetch(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unmatched_shape_without_message_is_unrecognized() {
        let raw = json!({ "whatever": 42 });
        let err = normalize_bill_fetch(&raw).unwrap_err();
        match err {
            AppError::UnrecognizedResponseShape { operation, raw } => {
                assert_eq!(operation, "bill fetch");
                assert_eq!(raw["whatever"], json!(42));
            }
            other => panic!("expected UnrecognizedResponseShape, got {:?}", other),
        }
    }

    #[test]
    fn unmatched_shape_with_error_message_becomes_remote_error() {
        let raw = json!({ "errorMessage": "Bill not found for given consumer number" });
        let err = normalize_bill_fetch(&raw).unwrap_err();
        match err {
            AppError::RemoteCallError(msg) => {
                assert_eq!(msg, "Bill not found for given consumer number")
            }
            other => panic!("expected RemoteCallError, got {:?}", other),
        }
    }

    #[test]
    fn validation_shapes_collapse_to_validation_key() {
        let raw = json!({ "data": { "billValidationResponse": { "valid": true } } });
        let out = normalize_bill_validation(&raw).unwrap();
        assert_eq!(out, json!({ "billValidationResponse": { "valid": true } }));
    }

    #[test]
    fn error_chain_prefers_top_level_error_message() {
        let raw = json!({
            "errorMessage": "top",
            "data": { "errorMessage": "under data" },
            "message": "generic"
        });
        assert_eq!(extract_error_message(&raw), "top");
    }

    #[test]
    fn error_chain_falls_through_in_order() {
        let raw = json!({
            "data": { "errorInfo": { "errorMessage": "nested" } },
            "responseMessage": "resp"
        });
        assert_eq!(extract_error_message(&raw), "nested");

        let raw = json!({ "responseMessage": "resp", "respReason": "reason" });
        assert_eq!(extract_error_message(&raw), "resp");

        let raw = json!({ "respReason": "reason" });
        assert_eq!(extract_error_message(&raw), "reason");
    }

    #[test]
    fn error_chain_uses_raw_string_body() {
        let raw = json!("Gateway timed out");
        assert_eq!(extract_error_message(&raw), "Gateway timed out");
    }

    #[test]
    fn error_chain_defaults_to_generic_message() {
        let raw = json!({ "status": 500 });
        assert_eq!(extract_error_message(&raw), "Something went wrong");
    }

    #[test]
    fn empty_messages_are_skipped() {
        let raw = json!({ "errorMessage": "  ", "message": "real one" });
        assert_eq!(extract_error_message(&raw), "real one");
    }
}
