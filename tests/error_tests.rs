//! Error Tests
//!
//! Tests for error types, classification, and HTTP status mapping.

use diascreen::DiascreenError;

#[test]
fn test_error_construction() {
    let config_err = DiascreenError::configuration("bad config", None);
    assert!(matches!(config_err, DiascreenError::Configuration { .. }));

    let artifact_err = DiascreenError::artifact("model", "download failed", None);
    assert!(matches!(artifact_err, DiascreenError::Artifact { .. }));

    let validation_err = DiascreenError::missing_fields(vec!["BMI"]);
    assert!(matches!(validation_err, DiascreenError::Validation { .. }));

    let inference_err = DiascreenError::inference("dimension mismatch");
    assert!(matches!(inference_err, DiascreenError::Inference { .. }));
}

#[test]
fn test_http_status_mapping() {
    assert_eq!(
        DiascreenError::missing_fields(vec!["BMI", "Age"]).to_http_status(),
        400
    );
    assert_eq!(DiascreenError::inference("bad value").to_http_status(), 500);
    assert_eq!(
        DiascreenError::internal("unexpected", None).to_http_status(),
        500
    );
    assert_eq!(
        DiascreenError::configuration("bad config", None).to_http_status(),
        500
    );
    assert_eq!(
        DiascreenError::artifact("scaler", "corrupt", None).to_http_status(),
        500
    );
}

#[test]
fn test_error_messages_are_surfaced_verbatim() {
    let err = DiascreenError::inference("field 'BMI' must be numeric, got a string");
    assert_eq!(
        err.to_string(),
        "Inference failed: field 'BMI' must be numeric, got a string"
    );

    let err = DiascreenError::missing_fields(vec!["HighBP", "HighChol"]);
    assert_eq!(err.to_string(), "Missing fields: [\"HighBP\", \"HighChol\"]");
}

#[test]
fn test_error_source_chain_is_preserved() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
    let err = DiascreenError::artifact("scaler", "failed to read scaler.json", Some(Box::new(io_err)));
    let source = std::error::Error::source(&err).expect("source should be preserved");
    assert!(source.to_string().contains("no such file"));
}
