/// Pure validation of customer-entered dynamic fields against the biller's
/// capability model, plus the fixed customer-mobile invariant.
///
/// Every rule is evaluated and every failure collected, so the caller can show
/// all problems at once. The engine has no side effects and is cheap enough to
/// re-run on every keystroke.
use crate::capability::BillerCapability;
use crate::models::Biller;
use regex::Regex;
use std::collections::HashMap;

const MOBILE_PATTERN: &str = r"^\d{10}$";

/// Validates the 10-digit customer mobile. Enforced independently of the
/// biller's dynamic parameter list.
pub fn is_valid_mobile(mobile: &str) -> bool {
    let re = Regex::new(MOBILE_PATTERN).unwrap();
    re.is_match(mobile)
}

/// Validates entered values against the biller's visible input parameters.
///
/// Rules per visible parameter:
/// - required and empty -> invalid
/// - value present and a pattern is set -> value must match; a pattern that
///   fails to compile counts as satisfied (catalog data is not trusted to
///   carry valid regexes, and the original flow accepted such fields)
/// - min/max length bounds apply only to present values
///
/// Hidden parameters never participate. Returns every failure message.
pub fn validate_inputs(
    inputs: &HashMap<String, String>,
    mobile: &str,
    biller: &Biller,
) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if !is_valid_mobile(mobile) {
        errors.push("Customer mobile must be exactly 10 digits.".to_string());
    }

    let capability = BillerCapability::new(biller);
    for param in capability.visible_params() {
        let value = inputs
            .get(&param.param_name)
            .map(|v| v.trim())
            .unwrap_or("");

        if value.is_empty() {
            if !param.is_optional {
                errors.push(format!("{} is required.", param.display_name));
            }
            continue;
        }

        if let Some(pattern) = param.regex_pattern.as_deref() {
            match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(value) {
                        errors.push(format!("{} is invalid.", param.display_name));
                        continue;
                    }
                }
                Err(e) => {
                    // Malformed catalog pattern: treated as satisfied.
                    tracing::warn!(
                        "Unusable regex for param '{}' ({}): {}",
                        param.param_name,
                        pattern,
                        e
                    );
                }
            }
        }

        if let Some(min) = param.min_length {
            if value.len() < min {
                errors.push(format!(
                    "{} must be at least {} characters.",
                    param.display_name, min
                ));
                continue;
            }
        }
        if let Some(max) = param.max_length {
            if value.len() > max {
                errors.push(format!(
                    "{} must be at most {} characters.",
                    param.display_name, max
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
