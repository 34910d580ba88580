use crate::models::{
    AmountInfo, CustomerInfo, FeeConfig, HandoffPayload, InputParamValue, InterchangeFeeCcf1,
    OrchestrationTag,
};
use chrono::Utc;
use moka::future::Cache;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Probes the primary API response for a fee field. Checked locations, in
/// order: `amountInfo.<field>` inside the inner response object, then the
/// inner object's own `<field>`.
fn api_fee_field(response: Option<&Value>, field: &str) -> Option<String> {
    let response = response?;
    // The response is the canonical `{"<responseKey>": {...}}` envelope.
    let inner = response.as_object()?.values().next()?;
    if let Some(v) = inner.get("amountInfo").and_then(|a| a.get(field)) {
        if let Some(s) = value_as_fee_string(v) {
            return Some(s);
        }
    }
    inner.get(field).and_then(value_as_fee_string)
}

/// Fee fields arrive as strings or numbers depending on backend; both become
/// the string representation the next screen expects.
fn value_as_fee_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalizes the CCF1 record: every numeric sub-field defaults to "0" and the
/// direction to the configured default when the fee config is absent.
pub fn normalize_fee_config(
    fee_config: Option<&FeeConfig>,
    fee_direction_default: &str,
) -> InterchangeFeeCcf1 {
    let zero = || "0".to_string();
    match fee_config {
        Some(fee) => InterchangeFeeCcf1 {
            fee_code: fee.fee_code.clone().unwrap_or_default(),
            flat_fee: fee.flat_fee.clone().unwrap_or_else(zero),
            percent_fee: fee.percent_fee.clone().unwrap_or_else(zero),
            fee_min_amt: fee.fee_min_amt.clone().unwrap_or_else(zero),
            fee_max_amt: fee.fee_max_amt.clone().unwrap_or_else(zero),
            fee_direction: fee
                .fee_direction
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| fee_direction_default.to_string()),
        },
        None => InterchangeFeeCcf1 {
            fee_code: String::new(),
            flat_fee: zero(),
            percent_fee: zero(),
            fee_min_amt: zero(),
            fee_max_amt: zero(),
            fee_direction: fee_direction_default.to_string(),
        },
    }
}

/// Assembles the hand-off payload from whichever calls ran.
///
/// `response` is the primary normalized API object (already merged when both
/// fetch and validation ran), or `None` for manual submissions. The payload is
/// created once and never mutated afterwards.
#[allow(clippy::too_many_arguments)]
pub fn build_handoff_payload(
    tag: OrchestrationTag,
    response: Option<Value>,
    request_id: String,
    service_id: &str,
    biller_id: &str,
    customer: &CustomerInfo,
    input_params: Vec<InputParamValue>,
    fee_config: Option<&FeeConfig>,
    fee_direction_default: &str,
    selected_plan_id: Option<String>,
) -> HandoffPayload {
    let interchange_fee_ccf1 = normalize_fee_config(fee_config, fee_direction_default);

    // API fee fields win over the fee config for amountInfo; the configured
    // interchange fields are carried regardless of what the API echoed.
    let amount_info = AmountInfo {
        flat_fee: api_fee_field(response.as_ref(), "flatFee")
            .unwrap_or_else(|| interchange_fee_ccf1.flat_fee.clone()),
        percent_fee: api_fee_field(response.as_ref(), "percentFee")
            .unwrap_or_else(|| interchange_fee_ccf1.percent_fee.clone()),
    };

    HandoffPayload {
        service_id: service_id.to_string(),
        biller_id: biller_id.to_string(),
        customer_mobile: customer.mobile.clone(),
        customer_pan: customer.pan.clone(),
        customer_name: customer.name.clone(),
        customer_email: customer.email.clone(),
        input_params,
        request_id,
        interchange_fee_ccf1,
        amount_info,
        source: tag,
        response,
        selected_plan_id,
        created_at: Utc::now(),
    }
}

/// Session-scoped hand-off slot between the orchestration and the next screen.
///
/// Single-writer, single-reader: a write overwrites any previous payload for
/// the session, and a read consumes the slot. Entries expire with the cache
/// TTL if never consumed.
#[derive(Clone)]
pub struct HandoffStore {
    cache: Cache<String, Arc<HandoffPayload>>,
}

impl HandoffStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(10_000)
                .build(),
        }
    }

    fn key(session_id: &str) -> String {
        format!("bbps:lastBillFetch:{}", session_id)
    }

    /// Stores the payload for the session, overwriting any previous value.
    /// Only one in-flight hand-off payload per session is supported.
    pub async fn put(&self, session_id: &str, payload: HandoffPayload) {
        self.cache
            .insert(Self::key(session_id), Arc::new(payload))
            .await;
    }

    /// Consume-once read: returns the payload and clears the slot.
    pub async fn take(&self, session_id: &str) -> Option<HandoffPayload> {
        let key = Self::key(session_id);
        let payload = self.cache.get(&key).await?;
        self.cache.invalidate(&key).await;
        Some(payload.as_ref().clone())
    }
}
