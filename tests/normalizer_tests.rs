/// Unit tests for the response normalizer
/// Tests shape convergence, idempotence, and the error-message priority chain
use rust_bbps_api::errors::AppError;
use rust_bbps_api::normalizer::{
    extract_error_message, normalize_bill_fetch, normalize_bill_validation, normalize_biller_info,
    try_extract_error_message,
};
use serde_json::json;

#[cfg(test)]
mod shape_convergence_tests {
    use super::*;

    fn inner() -> serde_json::Value {
        json!({
            "responseCode": "000",
            "billerResponse": {
                "billAmount": "820.00",
                "billDate": "2024-04-28",
                "customerName": "SUNITA DEVI",
                "dueDate": "2024-05-15"
            }
        })
    }

    #[test]
    fn all_four_fetch_shapes_converge_to_the_same_canonical_record() {
        let shape1 = json!({ "billFetchResponse": inner() });
        let shape2 = json!({ "data": { "billFetchResponse": inner() } });
        let shape3 = json!({ "data": inner() });
        let shape4 = inner();

        let out1 = normalize_bill_fetch(&shape1).unwrap();
        let out2 = normalize_bill_fetch(&shape2).unwrap();
        let out3 = normalize_bill_fetch(&shape3).unwrap();
        let out4 = normalize_bill_fetch(&shape4).unwrap();

        assert_eq!(out1, out2);
        assert_eq!(out2, out3);
        assert_eq!(out3, out4);
        assert!(out1.get("billFetchResponse").is_some());
    }

    #[test]
    fn bare_coded_shape_equals_canonical_shape_with_same_inner_values() {
        // Shape #4 at bare top level vs shape #1 carrying the same fields.
        let bare = inner();
        let canonical = json!({ "billFetchResponse": inner() });
        assert_eq!(
            normalize_bill_fetch(&bare).unwrap(),
            normalize_bill_fetch(&canonical).unwrap()
        );
    }

    #[test]
    fn normalizer_is_idempotent_for_every_shape() {
        for raw in [
            json!({ "billFetchResponse": inner() }),
            json!({ "data": { "billFetchResponse": inner() } }),
            json!({ "data": inner() }),
            inner(),
        ] {
            let once = normalize_bill_fetch(&raw).unwrap();
            let twice = normalize_bill_fetch(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", raw);
        }
    }

    #[test]
    fn precedence_prefers_canonical_key_over_coded_body() {
        // A payload carrying both the canonical key and a coded body must be
        // read as the canonical shape.
        let raw = json!({
            "billFetchResponse": { "billAmount": "1" },
            "responseCode": "000",
            "billerResponse": { "billAmount": "2" }
        });
        let out = normalize_bill_fetch(&raw).unwrap();
        assert_eq!(out["billFetchResponse"]["billAmount"], json!("1"));
    }

    #[test]
    fn validation_shapes_converge_like_fetch_shapes() {
        let shape1 = json!({ "billValidationResponse": { "valid": true } });
        let shape2 = json!({ "data": { "billValidationResponse": { "valid": true } } });
        assert_eq!(
            normalize_bill_validation(&shape1).unwrap(),
            normalize_bill_validation(&shape2).unwrap()
        );
    }

    #[test]
    fn biller_info_unwraps_data_layer() {
        let raw = json!({ "data": { "billerInfoResponse": { "billerId": "B1" } } });
        let out = normalize_biller_info(&raw).unwrap();
        assert_eq!(out, json!({ "billerInfoResponse": { "billerId": "B1" } }));
    }

    #[test]
    fn unknown_shape_is_a_typed_failure_with_the_raw_body() {
        let raw = json!({ "totally": "unexpected" });
        match normalize_bill_fetch(&raw).unwrap_err() {
            AppError::UnrecognizedResponseShape { raw: kept, .. } => {
                assert_eq!(kept, raw);
            }
            other => panic!("expected UnrecognizedResponseShape, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod error_chain_tests {
    use super::*;

    #[test]
    fn full_priority_order_is_respected() {
        // Build a payload carrying every probe location, then strip them one
        // by one from highest priority downwards.
        let mut raw = json!({
            "errorMessage": "1-top",
            "data": {
                "errorMessage": "2-data",
                "errorInfo": { "errorMessage": "4-data-errorInfo" }
            },
            "errorInfo": { "errorMessage": "3-errorInfo" },
            "message": "5-message",
            "responseMessage": "6-responseMessage",
            "respReason": "7-respReason"
        });

        assert_eq!(extract_error_message(&raw), "1-top");

        raw.as_object_mut().unwrap().remove("errorMessage");
        assert_eq!(extract_error_message(&raw), "2-data");

        raw["data"].as_object_mut().unwrap().remove("errorMessage");
        assert_eq!(extract_error_message(&raw), "3-errorInfo");

        raw.as_object_mut().unwrap().remove("errorInfo");
        assert_eq!(extract_error_message(&raw), "4-data-errorInfo");

        raw.as_object_mut().unwrap().remove("data");
        assert_eq!(extract_error_message(&raw), "5-message");

        raw.as_object_mut().unwrap().remove("message");
        assert_eq!(extract_error_message(&raw), "6-responseMessage");

        raw.as_object_mut().unwrap().remove("responseMessage");
        assert_eq!(extract_error_message(&raw), "7-respReason");

        raw.as_object_mut().unwrap().remove("respReason");
        assert_eq!(extract_error_message(&raw), "Something went wrong");
    }

    #[test]
    fn raw_string_body_beats_the_generic_fallback() {
        assert_eq!(
            extract_error_message(&json!("Service temporarily unavailable")),
            "Service temporarily unavailable"
        );
    }

    #[test]
    fn try_variant_reports_absence_instead_of_generic_text() {
        assert_eq!(try_extract_error_message(&json!({ "code": 42 })), None);
        assert_eq!(
            try_extract_error_message(&json!({ "message": "boom" })),
            Some("boom".to_string())
        );
    }

    #[test]
    fn non_string_values_at_probe_locations_are_skipped() {
        let raw = json!({ "errorMessage": { "nested": "object" }, "message": "usable" });
        assert_eq!(extract_error_message(&raw), "usable");
    }
}
