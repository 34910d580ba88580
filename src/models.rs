use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Biller Catalog Models ============

/// Whether a biller requires the bill-fetch call before payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchRequirement {
    Mandatory,
    Optional,
    NotRequired,
}

/// Whether a biller supports or requires plan selection (prepaid/postpaid plans).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanRequirement {
    Mandatory,
    Optional,
    NotSupported,
}

/// Whether a biller requires the bill-validation call before payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationRequirement {
    Mandatory,
    Optional,
    NotRequired,
}

/// Payment amount exactness declared by the biller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentExactness {
    Exact,
    Range,
}

/// A dynamic input-parameter descriptor from the biller catalog.
///
/// Descriptors are read-only: the catalog owns them and the client never
/// mutates them. Only `is_visible` parameters participate in the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputParam {
    #[serde(rename = "paramName")]
    pub param_name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Validation pattern as delivered by the catalog. May be malformed.
    #[serde(rename = "regexPattern", default)]
    pub regex_pattern: Option<String>,
    #[serde(rename = "minLength", default)]
    pub min_length: Option<usize>,
    #[serde(rename = "maxLength", default)]
    pub max_length: Option<usize>,
    #[serde(rename = "isOptional", default)]
    pub is_optional: bool,
    #[serde(rename = "isVisible", default = "default_true")]
    pub is_visible: bool,
}

fn default_true() -> bool {
    true
}

/// A billing entity registered in the BBPS catalog.
///
/// The requirement fields arrive as nullable/empty upstream; defaulting to
/// NOT_REQUIRED / NOT_SUPPORTED happens in the capability accessors, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Biller {
    #[serde(rename = "billerId")]
    pub biller_id: String,
    #[serde(rename = "billerName", default)]
    pub biller_name: Option<String>,
    /// "ACTIVE" or "INACTIVE".
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "fetchRequirement", default)]
    pub fetch_requirement: Option<FetchRequirement>,
    #[serde(rename = "planRequirement", default)]
    pub plan_requirement: Option<PlanRequirement>,
    #[serde(rename = "validationRequirement", default)]
    pub validation_requirement: Option<ValidationRequirement>,
    #[serde(rename = "paymentExactness", default)]
    pub payment_exactness: Option<PaymentExactness>,
    #[serde(rename = "inputParams", default)]
    pub input_params: Vec<InputParam>,
}

/// A selectable prepaid/postpaid plan for a biller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "planId")]
    pub plan_id: String,
    #[serde(rename = "billerId")]
    pub biller_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "subCategory", default)]
    pub sub_category: Option<String>,
    #[serde(rename = "amountInRupees")]
    pub amount_in_rupees: String,
    #[serde(rename = "effectiveFrom", default)]
    pub effective_from: Option<DateTime<Utc>>,
    #[serde(rename = "effectiveTo", default)]
    pub effective_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Plan {
    /// A plan is active iff its status is ACTIVE and `at` falls inside the
    /// effective window. A missing bound leaves that side open-ended.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        if self.status.as_deref() != Some("ACTIVE") {
            return false;
        }
        if let Some(from) = self.effective_from {
            if at < from {
                return false;
            }
        }
        if let Some(to) = self.effective_to {
            if at > to {
                return false;
            }
        }
        true
    }
}

// ============ Customer & Fee Models ============

/// Customer identity entered on the payment form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// 10-digit mobile number. Validated before any remote call.
    pub mobile: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub pan: Option<String>,
    #[serde(default)]
    pub aadhaar: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Per-biller interchange fee configuration (CCF1) as delivered upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    #[serde(rename = "feeCode", default)]
    pub fee_code: Option<String>,
    #[serde(rename = "flatFee", default)]
    pub flat_fee: Option<String>,
    #[serde(rename = "percentFee", default)]
    pub percent_fee: Option<String>,
    #[serde(rename = "feeMinAmt", default)]
    pub fee_min_amt: Option<String>,
    #[serde(rename = "feeMaxAmt", default)]
    pub fee_max_amt: Option<String>,
    #[serde(rename = "feeDirection", default)]
    pub fee_direction: Option<String>,
}

/// Normalized CCF1 record embedded in the hand-off payload.
///
/// Every numeric sub-field defaults to `"0"` and the direction to the
/// configured default when the fee config is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchangeFeeCcf1 {
    #[serde(rename = "feeCode")]
    pub fee_code: String,
    #[serde(rename = "flatFee")]
    pub flat_fee: String,
    #[serde(rename = "percentFee")]
    pub percent_fee: String,
    #[serde(rename = "feeMinAmt")]
    pub fee_min_amt: String,
    #[serde(rename = "feeMaxAmt")]
    pub fee_max_amt: String,
    #[serde(rename = "feeDirection")]
    pub fee_direction: String,
}

/// Flat/percent fee exposed to the next screen. API values win over the fee
/// config; the configured interchange fields are always carried regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountInfo {
    #[serde(rename = "flatFee")]
    pub flat_fee: String,
    #[serde(rename = "percentFee")]
    pub percent_fee: String,
}

// ============ Orchestration Models ============

/// How the hand-off payload was produced. Carried forward for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestrationTag {
    #[serde(rename = "fetch")]
    Fetch,
    #[serde(rename = "fetch+validation")]
    FetchAndValidation,
    #[serde(rename = "validation")]
    Validation,
    #[serde(rename = "manual")]
    Manual,
}

impl std::fmt::Display for OrchestrationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrchestrationTag::Fetch => "fetch",
            OrchestrationTag::FetchAndValidation => "fetch+validation",
            OrchestrationTag::Validation => "validation",
            OrchestrationTag::Manual => "manual",
        };
        write!(f, "{}", s)
    }
}

/// One entered input parameter, normalized for the hand-off payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputParamValue {
    #[serde(rename = "paramName")]
    pub param_name: String,
    pub value: String,
}

/// The single normalized record passed to the next screen in the flow.
///
/// Built exactly once per submission; never mutated afterwards. Persisted
/// transiently in the session hand-off store and consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffPayload {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "billerId")]
    pub biller_id: String,
    #[serde(rename = "customerMobile")]
    pub customer_mobile: String,
    #[serde(rename = "customerPan", skip_serializing_if = "Option::is_none")]
    pub customer_pan: Option<String>,
    #[serde(rename = "customerName", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(rename = "customerEmail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(rename = "inputParams")]
    pub input_params: Vec<InputParamValue>,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "interchangeFeeCCF1")]
    pub interchange_fee_ccf1: InterchangeFeeCcf1,
    #[serde(rename = "amountInfo")]
    pub amount_info: AmountInfo,
    /// How this payload was produced.
    pub source: OrchestrationTag,
    /// Primary normalized API response. Absent for `manual` submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(rename = "selectedPlanId", skip_serializing_if = "Option::is_none")]
    pub selected_plan_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

// ============ Request DTOs ============

/// Query parameters for the biller catalog listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListBillersParams {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
}

/// Query parameters for the plan pull.
#[derive(Debug, Clone, Deserialize)]
pub struct PullPlansParams {
    #[serde(rename = "serviceId")]
    pub service_id: String,
}

/// Body of POST /api/v1/bills/submit.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBillRequest {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
    #[serde(rename = "billerId")]
    pub biller_id: String,
    pub customer: CustomerInfo,
    /// Entered values keyed by `paramName`.
    #[serde(rename = "inputValues", default)]
    pub input_values: std::collections::HashMap<String, String>,
    #[serde(rename = "selectedPlanId", default)]
    pub selected_plan_id: Option<String>,
    /// Session slot for the hand-off payload. One in-flight payload per session.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plan(status: &str, from: Option<&str>, to: Option<&str>) -> Plan {
        Plan {
            plan_id: "P1".to_string(),
            biller_id: "B1".to_string(),
            category: Some("DATA".to_string()),
            sub_category: None,
            amount_in_rupees: "199".to_string(),
            effective_from: from.map(|s| s.parse().unwrap()),
            effective_to: to.map(|s| s.parse().unwrap()),
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn plan_with_past_effective_to_is_inactive() {
        let p = plan(
            "ACTIVE",
            Some("2020-01-01T00:00:00Z"),
            Some("2021-01-01T00:00:00Z"),
        );
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(!p.is_active_at(now));
    }

    #[test]
    fn plan_with_open_ended_effective_to_stays_active() {
        let p = plan("ACTIVE", Some("2020-01-01T00:00:00Z"), None);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(p.is_active_at(now));
    }

    #[test]
    fn plan_before_effective_from_is_inactive() {
        let p = plan("ACTIVE", Some("2030-01-01T00:00:00Z"), None);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(!p.is_active_at(now));
    }

    #[test]
    fn inactive_status_excludes_plan_regardless_of_window() {
        let p = plan("INACTIVE", None, None);
        assert!(!p.is_active_at(Utc::now()));
    }

    #[test]
    fn orchestration_tag_serializes_to_wire_strings() {
        assert_eq!(
            serde_json::to_string(&OrchestrationTag::FetchAndValidation).unwrap(),
            "\"fetch+validation\""
        );
        assert_eq!(
            serde_json::to_string(&OrchestrationTag::Manual).unwrap(),
            "\"manual\""
        );
    }

    #[test]
    fn biller_deserializes_with_missing_requirement_fields() {
        let raw = serde_json::json!({
            "billerId": "VODA00000MUM03",
            "billerName": "Vodafone Mumbai",
            "status": "ACTIVE"
        });
        let biller: Biller = serde_json::from_value(raw).unwrap();
        assert!(biller.fetch_requirement.is_none());
        assert!(biller.plan_requirement.is_none());
        assert!(biller.input_params.is_empty());
    }
}
