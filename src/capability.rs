/// Read-only capability view over a selected biller.
///
/// Upstream catalog records leave the requirement flags null or empty more
/// often than not; every accessor applies the documented default so callers
/// never have to reason about absence. The view is rebuilt whenever the
/// selected biller changes.
use crate::models::{
    Biller, FetchRequirement, InputParam, PaymentExactness, PlanRequirement,
    ValidationRequirement,
};

pub struct BillerCapability<'a> {
    biller: &'a Biller,
}

impl<'a> BillerCapability<'a> {
    pub fn new(biller: &'a Biller) -> Self {
        Self { biller }
    }

    /// True iff the catalog marks the biller ACTIVE.
    pub fn is_active(&self) -> bool {
        self.biller.status.as_deref() == Some("ACTIVE")
    }

    /// Fetch requirement, defaulting to NOT_REQUIRED when upstream omits it.
    pub fn fetch_requirement(&self) -> FetchRequirement {
        self.biller
            .fetch_requirement
            .unwrap_or(FetchRequirement::NotRequired)
    }

    /// Plan requirement, defaulting to NOT_SUPPORTED when upstream omits it.
    pub fn plan_requirement(&self) -> PlanRequirement {
        self.biller
            .plan_requirement
            .unwrap_or(PlanRequirement::NotSupported)
    }

    /// Validation requirement, defaulting to NOT_REQUIRED when upstream omits it.
    pub fn validation_requirement(&self) -> ValidationRequirement {
        self.biller
            .validation_requirement
            .unwrap_or(ValidationRequirement::NotRequired)
    }

    /// Payment exactness; None when the biller declares neither EXACT nor RANGE.
    pub fn payment_exactness(&self) -> Option<PaymentExactness> {
        self.biller.payment_exactness
    }

    /// The input parameters that participate in the form, in catalog order.
    pub fn visible_params(&self) -> impl Iterator<Item = &InputParam> {
        self.biller.input_params.iter().filter(|p| p.is_visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_biller() -> Biller {
        serde_json::from_value(serde_json::json!({
            "billerId": "TNEB00000TN001",
            "status": "ACTIVE"
        }))
        .unwrap()
    }

    #[test]
    fn missing_flags_fall_back_to_documented_defaults() {
        let biller = bare_biller();
        let cap = BillerCapability::new(&biller);
        assert_eq!(cap.fetch_requirement(), FetchRequirement::NotRequired);
        assert_eq!(cap.plan_requirement(), PlanRequirement::NotSupported);
        assert_eq!(
            cap.validation_requirement(),
            ValidationRequirement::NotRequired
        );
        assert_eq!(cap.payment_exactness(), None);
    }

    #[test]
    fn inactive_and_missing_status_are_not_active() {
        let mut biller = bare_biller();
        biller.status = Some("INACTIVE".to_string());
        assert!(!BillerCapability::new(&biller).is_active());

        biller.status = None;
        assert!(!BillerCapability::new(&biller).is_active());
    }

    #[test]
    fn hidden_params_are_filtered_out() {
        let biller: Biller = serde_json::from_value(serde_json::json!({
            "billerId": "B1",
            "status": "ACTIVE",
            "inputParams": [
                { "paramName": "consumerNo", "displayName": "Consumer Number", "isVisible": true },
                { "paramName": "circleCode", "displayName": "Circle", "isVisible": false }
            ]
        }))
        .unwrap();
        let cap = BillerCapability::new(&biller);
        let names: Vec<_> = cap.visible_params().map(|p| p.param_name.as_str()).collect();
        assert_eq!(names, vec!["consumerNo"]);
    }
}
