use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Local pre-submission validation failures, one message per field.
    ValidationError(Vec<String>),
    /// A remote operation returned a non-success envelope. Carries the
    /// user-facing message extracted by the normalizer's priority chain.
    RemoteCallError(String),
    /// The normalizer could not match any known envelope shape.
    /// The raw body is kept for diagnostics.
    UnrecognizedResponseShape {
        /// Which remote operation produced the payload.
        operation: String,
        /// The unparseable payload, verbatim.
        raw: serde_json::Value,
    },
    /// Control-flow interrupt, not a failure: the biller demands a plan and
    /// none has been selected yet.
    PlanSelectionRequired,
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Resource not found error.
    NotFound(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(msgs) => {
                write!(f, "Validation failed: {}", msgs.join(" "))
            }
            AppError::RemoteCallError(msg) => write!(f, "Remote call error: {}", msg),
            AppError::UnrecognizedResponseShape { operation, .. } => {
                write!(f, "Unrecognized {} response shape", operation)
            }
            AppError::PlanSelectionRequired => write!(f, "Plan selection required"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Logs errors appropriately based on their severity.
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::ValidationError(msgs) => {
                // Inline per-field messages plus the whitespace-joined summary
                // the form surfaces as a single line.
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": msgs.join(" "),
                        "fieldErrors": msgs,
                    }),
                )
            }
            AppError::RemoteCallError(msg) => {
                tracing::error!("Remote call error: {}", msg);
                (StatusCode::BAD_GATEWAY, json!({ "error": msg }))
            }
            AppError::UnrecognizedResponseShape { operation, raw } => {
                tracing::error!(
                    "Unrecognized {} response shape: {}",
                    operation,
                    raw.to_string()
                );
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Something went wrong" }),
                )
            }
            AppError::PlanSelectionRequired => (
                StatusCode::CONFLICT,
                json!({
                    "error": "Plan selection required",
                    "planSelectionRequired": true,
                }),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                // Delegate to underlying error's response
                return source.clone().into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    ///
    /// Transport failures (timeouts included) surface as remote-call errors.
    fn from(err: reqwest::Error) -> Self {
        AppError::RemoteCallError(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    #[allow(dead_code)]
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
