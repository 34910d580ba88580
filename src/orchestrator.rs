/// The bill-payment aggregation orchestrator.
///
/// Given a biller's capability flags and validated inputs, decides which of
/// the remote operations (bill fetch, bill validation) must run and in what
/// order, sequences the plan-selection interrupt, and reconciles the results
/// into the single hand-off payload consumed by the payment screen.
use crate::capability::BillerCapability;
use crate::clients::BbpsClient;
use crate::errors::AppError;
use crate::handoff::build_handoff_payload;
use crate::models::{
    Biller, CustomerInfo, FeeConfig, FetchRequirement, HandoffPayload, InputParamValue,
    OrchestrationTag, Plan, PlanRequirement, ValidationRequirement,
};
use crate::normalizer::{normalize_bill_fetch, normalize_bill_validation};
use crate::validation::validate_inputs;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Lifecycle of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationState {
    Idle,
    AwaitingInput,
    PlanRequired,
    Executing,
    Settled,
}

/// All mutable state of one submission flow, in one place.
///
/// The former page scattered this across component state (selected biller,
/// entered values, selected plan, fetch error, plan modal); here the
/// biller-change reset is a single atomic transition.
#[derive(Debug)]
pub struct OrchestrationContext {
    pub state: OrchestrationState,
    pub biller: Option<Biller>,
    pub input_values: HashMap<String, String>,
    pub selected_plan_id: Option<String>,
    pub last_error: Option<String>,
    pub plan_modal_open: bool,
}

impl OrchestrationContext {
    pub fn new() -> Self {
        Self {
            state: OrchestrationState::Idle,
            biller: None,
            input_values: HashMap::new(),
            selected_plan_id: None,
            last_error: None,
            plan_modal_open: false,
        }
    }

    /// Selecting a biller resets all downstream form state: entered values,
    /// selected plan, prior fetch error, and the plan-selection modal.
    /// Unconditional and atomic.
    pub fn select_biller(&mut self, biller: Biller) {
        self.biller = Some(biller);
        self.input_values.clear();
        self.selected_plan_id = None;
        self.last_error = None;
        self.plan_modal_open = false;
        self.state = OrchestrationState::AwaitingInput;
    }

    pub fn set_input_values(&mut self, values: HashMap<String, String>) {
        self.input_values = values;
    }

    pub fn select_plan(&mut self, plan_id: Option<String>) {
        self.selected_plan_id = plan_id;
        self.plan_modal_open = false;
    }
}

impl Default for OrchestrationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the request id from whichever API responses ran, in priority
/// order, synthesizing a local id when none was echoed. The fallback is
/// unique within a session but explicitly not guaranteed globally unique.
pub fn resolve_request_id(responses: &[&Value]) -> String {
    for raw in responses {
        if let Some(id) = raw.get("requestId").and_then(|v| v.as_str()) {
            if !id.is_empty() {
                return id.to_string();
            }
        }
        if let Some(id) = raw
            .get("data")
            .and_then(|d| d.get("requestId"))
            .and_then(|v| v.as_str())
        {
            if !id.is_empty() {
                return id.to_string();
            }
        }
    }
    uuid::Uuid::new_v4().to_string()
}

/// Guard against responses that arrive after the user switched billers: a
/// response echoing a different biller id than the current selection is
/// stale and must not be applied. Responses without an echoed biller id are
/// accepted (nothing to compare).
fn check_echoed_biller(raw: &Value, biller_id: &str, operation: &str) -> Result<(), AppError> {
    let echoed = raw
        .get("billerId")
        .and_then(|v| v.as_str())
        .or_else(|| {
            raw.get("data")
                .and_then(|d| d.get("billerId"))
                .and_then(|v| v.as_str())
        });

    match echoed {
        Some(echoed) if echoed != biller_id => {
            tracing::warn!(
                "Discarding stale {} response: echoed biller {} != selected {}",
                operation,
                echoed,
                biller_id
            );
            Err(AppError::RemoteCallError(
                "Received a response for a different biller. Please try again.".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

/// Fills keys missing from the primary inner object with values from the
/// fallback inner object. Primary fields always win.
fn fill_missing_fields(primary: &mut Map<String, Value>, fallback: &Map<String, Value>) {
    for (k, v) in fallback {
        if !primary.contains_key(k) {
            primary.insert(k.clone(), v.clone());
        }
    }
}

/// Merges the fetch result into the validation result: the validation
/// response is the primary object, the fetch response only sources fields the
/// validation response lacks.
fn merge_validation_primary(validation_envelope: Value, fetch_envelope: &Value) -> Value {
    let mut primary_inner = validation_envelope
        .get("billValidationResponse")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    if let Some(fetch_inner) = fetch_envelope
        .get("billFetchResponse")
        .and_then(|v| v.as_object())
    {
        fill_missing_fields(&mut primary_inner, fetch_inner);
    }
    serde_json::json!({ "billValidationResponse": primary_inner })
}

pub struct Orchestrator<'a> {
    client: &'a BbpsClient,
    fee_direction_default: &'a str,
}

impl<'a> Orchestrator<'a> {
    pub fn new(client: &'a BbpsClient, fee_direction_default: &'a str) -> Self {
        Self {
            client,
            fee_direction_default,
        }
    }

    /// Runs the full decision table for one submission and returns the
    /// hand-off payload.
    ///
    /// Evaluated in order:
    /// 1. fetch MANDATORY and plan MANDATORY without a selected plan ->
    ///    plan-selection interrupt, zero remote calls
    /// 2. fetch MANDATORY -> bill fetch; then bill validation with the same
    ///    inputs when validation is MANDATORY (validation result primary)
    /// 3. otherwise -> validation-only when validation is MANDATORY, else a
    ///    manual payload with no remote call
    ///
    /// Any remote failure aborts the whole run; resubmission re-runs the
    /// table from scratch. Remote calls are strictly sequential. The fee
    /// config is supplied by the caller (it ships with the biller metadata),
    /// so a manual submission issues no remote call at all.
    pub async fn run(
        &self,
        service_id: &str,
        biller: &Biller,
        customer: &CustomerInfo,
        input_values: &HashMap<String, String>,
        selected_plan_id: Option<&str>,
        fee_config: Option<&FeeConfig>,
    ) -> Result<HandoffPayload, AppError> {
        let mut context = OrchestrationContext::new();
        context.select_biller(biller.clone());
        context.set_input_values(input_values.clone());
        context.select_plan(selected_plan_id.map(String::from));

        let capability = BillerCapability::new(biller);
        if !capability.is_active() {
            return Err(AppError::BadRequest(format!(
                "Biller {} is not active",
                biller.biller_id
            )));
        }

        validate_inputs(&context.input_values, &customer.mobile, biller)
            .map_err(AppError::ValidationError)?;

        let fetch_req = capability.fetch_requirement();
        let plan_req = capability.plan_requirement();
        let validation_req = capability.validation_requirement();

        // Rule 1: the plan-selection interrupt precedes any remote call.
        if fetch_req == FetchRequirement::Mandatory
            && plan_req == PlanRequirement::Mandatory
            && context.selected_plan_id.is_none()
        {
            context.state = OrchestrationState::PlanRequired;
            context.plan_modal_open = true;
            tracing::info!(
                "Biller {} requires a plan; interrupting before any remote call",
                biller.biller_id
            );
            return Err(AppError::PlanSelectionRequired);
        }

        context.state = OrchestrationState::Executing;

        let input_params: Vec<InputParamValue> = capability
            .visible_params()
            .filter_map(|p| {
                context
                    .input_values
                    .get(&p.param_name)
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(|v| InputParamValue {
                        param_name: p.param_name.clone(),
                        value: v.to_string(),
                    })
            })
            .collect();

        let (tag, response, request_id) = if fetch_req == FetchRequirement::Mandatory {
            let raw_fetch = self
                .client
                .bill_fetch(&biller.biller_id, &customer.mobile, &input_params)
                .await?;
            check_echoed_biller(&raw_fetch, &biller.biller_id, "bill fetch")?;
            let fetch_envelope = normalize_bill_fetch(&raw_fetch)?;

            if validation_req == ValidationRequirement::Mandatory {
                // Validation runs only after fetch resolved, with the same
                // input parameters; its result becomes the primary response.
                let raw_validation = self
                    .client
                    .bill_validate(&biller.biller_id, &input_params)
                    .await?;
                check_echoed_biller(&raw_validation, &biller.biller_id, "bill validation")?;
                let validation_envelope = normalize_bill_validation(&raw_validation)?;
                let merged = merge_validation_primary(validation_envelope, &fetch_envelope);
                let request_id = resolve_request_id(&[&raw_validation, &raw_fetch]);
                (
                    OrchestrationTag::FetchAndValidation,
                    Some(merged),
                    request_id,
                )
            } else {
                let request_id = resolve_request_id(&[&raw_fetch]);
                (OrchestrationTag::Fetch, Some(fetch_envelope), request_id)
            }
        } else if validation_req == ValidationRequirement::Mandatory {
            let raw_validation = self
                .client
                .bill_validate(&biller.biller_id, &input_params)
                .await?;
            check_echoed_biller(&raw_validation, &biller.biller_id, "bill validation")?;
            let validation_envelope = normalize_bill_validation(&raw_validation)?;
            let request_id = resolve_request_id(&[&raw_validation]);
            (
                OrchestrationTag::Validation,
                Some(validation_envelope),
                request_id,
            )
        } else {
            // No mandatory remote operation: the payload is populated solely
            // from user input and biller/fee metadata.
            (OrchestrationTag::Manual, None, resolve_request_id(&[]))
        };

        context.state = OrchestrationState::Settled;
        tracing::info!(
            "Orchestration settled for biller {} with tag {}",
            biller.biller_id,
            tag
        );

        Ok(build_handoff_payload(
            tag,
            response,
            request_id,
            service_id,
            &biller.biller_id,
            customer,
            input_params,
            fee_config,
            self.fee_direction_default,
            context.selected_plan_id.clone(),
        ))
    }
}

/// Filters a pulled plan list down to currently-active plans.
pub fn active_plans(plans: Vec<Plan>) -> Vec<Plan> {
    let now = chrono::Utc::now();
    plans.into_iter().filter(|p| p.is_active_at(now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selecting_a_biller_resets_all_downstream_state() {
        let biller_a: Biller =
            serde_json::from_value(json!({ "billerId": "A", "status": "ACTIVE" })).unwrap();
        let biller_b: Biller =
            serde_json::from_value(json!({ "billerId": "B", "status": "ACTIVE" })).unwrap();

        let mut ctx = OrchestrationContext::new();
        ctx.select_biller(biller_a);
        ctx.set_input_values(HashMap::from([(
            "consumerNo".to_string(),
            "12345".to_string(),
        )]));
        ctx.select_plan(Some("P1".to_string()));
        ctx.last_error = Some("old failure".to_string());
        ctx.plan_modal_open = true;

        ctx.select_biller(biller_b);

        assert!(ctx.input_values.is_empty());
        assert!(ctx.selected_plan_id.is_none());
        assert!(ctx.last_error.is_none());
        assert!(!ctx.plan_modal_open);
        assert_eq!(ctx.state, OrchestrationState::AwaitingInput);
        assert_eq!(ctx.biller.as_ref().unwrap().biller_id, "B");
    }

    #[test]
    fn request_id_prefers_top_level_then_data() {
        let top = json!({ "requestId": "TOP" });
        let nested = json!({ "data": { "requestId": "NESTED" } });
        assert_eq!(resolve_request_id(&[&top, &nested]), "TOP");
        assert_eq!(resolve_request_id(&[&nested]), "NESTED");
    }

    #[test]
    fn request_id_checks_responses_in_priority_order() {
        let first = json!({ "status": "ok" });
        let second = json!({ "requestId": "SECOND" });
        assert_eq!(resolve_request_id(&[&first, &second]), "SECOND");
    }

    #[test]
    fn request_id_falls_back_to_synthesized_unique_id() {
        let a = resolve_request_id(&[]);
        let b = resolve_request_id(&[]);
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn mismatched_echoed_biller_is_rejected() {
        let raw = json!({ "billerId": "OTHER", "billFetchResponse": {} });
        let err = check_echoed_biller(&raw, "SELECTED", "bill fetch").unwrap_err();
        assert!(matches!(err, AppError::RemoteCallError(_)));
    }

    #[test]
    fn missing_echoed_biller_is_accepted() {
        let raw = json!({ "billFetchResponse": {} });
        assert!(check_echoed_biller(&raw, "SELECTED", "bill fetch").is_ok());
    }

    #[test]
    fn validation_primary_merge_keeps_validation_fields() {
        let validation = json!({
            "billValidationResponse": { "billAmount": "200", "valid": true }
        });
        let fetch = json!({
            "billFetchResponse": { "billAmount": "100", "dueDate": "2024-05-18" }
        });
        let merged = merge_validation_primary(validation, &fetch);
        let inner = &merged["billValidationResponse"];
        // Validation wins on conflicts; fetch fills the gaps.
        assert_eq!(inner["billAmount"], json!("200"));
        assert_eq!(inner["valid"], json!(true));
        assert_eq!(inner["dueDate"], json!("2024-05-18"));
    }

    #[test]
    fn active_plan_filter_drops_expired_plans() {
        let plans: Vec<Plan> = serde_json::from_value(json!([
            { "planId": "P1", "billerId": "B1", "amountInRupees": "199",
              "status": "ACTIVE", "effectiveTo": "2020-01-01T00:00:00Z" },
            { "planId": "P2", "billerId": "B1", "amountInRupees": "299",
              "status": "ACTIVE" }
        ]))
        .unwrap();
        let active = active_plans(plans);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].plan_id, "P2");
    }
}
