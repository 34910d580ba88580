use crate::errors::AppError;
use crate::models::{Biller, FeeConfig, InputParamValue, Plan};
use crate::normalizer::extract_error_message;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for the BBPS aggregator upstream (biller catalog, plan catalog,
/// bill fetch, bill validation, fee configuration).
///
/// The base URL is injected so tests can point the client at a mock server.
/// Each call carries the fixed transport timeout; there is no retry policy.
#[derive(Clone)]
pub struct BbpsClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl BbpsClient {
    /// Creates a new `BbpsClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the BBPS aggregator.
    /// * `token` - The API token for authentication.
    pub fn new(base_url: String, token: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create BBPS client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Reads a non-success response body and routes it through the error
    /// message priority chain.
    async fn error_from_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = match serde_json::from_str::<Value>(&text) {
            Ok(body) => extract_error_message(&body),
            Err(_) => extract_error_message(&Value::String(text)),
        };
        tracing::error!("BBPS upstream returned {}: {}", status, message);
        AppError::RemoteCallError(message)
    }

    /// Lists billers for a service/category pair.
    pub async fn list_billers(
        &self,
        service_id: &str,
        category_id: &str,
    ) -> Result<Vec<Biller>, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/billers", self.base_url),
            &[("serviceId", service_id), ("categoryId", category_id)],
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build URL: {}", e)))?;

        tracing::info!(
            "Listing billers for service {} category {}",
            service_id,
            category_id
        );

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| AppError::RemoteCallError(format!("Biller catalog request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::RemoteCallError(format!("Failed to parse biller catalog response: {}", e))
        })?;

        let billers = list_from_body(body, "biller catalog")?;
        tracing::info!("Fetched {} billers", billers.len());
        Ok(billers)
    }

    /// Pulls the plan list for a biller. Active-plan filtering is the caller's
    /// concern; this returns the catalog verbatim.
    pub async fn pull_plans(
        &self,
        service_id: &str,
        biller_id: &str,
    ) -> Result<Vec<Plan>, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/plans", self.base_url),
            &[("serviceId", service_id), ("billerId", biller_id)],
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Pulling plans for biller {}", biller_id);

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| AppError::RemoteCallError(format!("Plan pull request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::RemoteCallError(format!("Failed to parse plan pull response: {}", e))
        })?;

        let plans = list_from_body(body, "plan pull")?;
        tracing::info!("Fetched {} plans for biller {}", plans.len(), biller_id);
        Ok(plans)
    }

    /// Retrieves current bill details for a customer+biller pair.
    ///
    /// The body is returned raw; the normalizer owns shape handling.
    pub async fn bill_fetch(
        &self,
        biller_id: &str,
        customer_mobile: &str,
        input_params: &[InputParamValue],
    ) -> Result<Value, AppError> {
        let url = format!("{}/bill/fetch", self.base_url);
        let body = json!({
            "billerId": biller_id,
            "customerInfo": { "customerMobile": customer_mobile },
            "inputParams": { "input": input_params },
        });

        tracing::info!("Bill fetch for biller {}", biller_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::RemoteCallError(format!("Bill fetch request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let raw: Value = response.json().await.map_err(|e| {
            AppError::RemoteCallError(format!("Failed to parse bill fetch response: {}", e))
        })?;

        Ok(raw)
    }

    /// Confirms the entered parameters are acceptable to the biller.
    pub async fn bill_validate(
        &self,
        biller_id: &str,
        input_params: &[InputParamValue],
    ) -> Result<Value, AppError> {
        let url = format!("{}/bill/validate", self.base_url);
        let body = json!({
            "billerId": biller_id,
            "inputParams": { "input": input_params },
        });

        tracing::info!("Bill validation for biller {}", biller_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::RemoteCallError(format!("Bill validation request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let raw: Value = response.json().await.map_err(|e| {
            AppError::RemoteCallError(format!("Failed to parse bill validation response: {}", e))
        })?;

        Ok(raw)
    }

    /// Fetches the per-biller interchange fee configuration. A missing record
    /// is not an error; the hand-off builder falls back to zeroed defaults.
    pub async fn fee_config(&self, biller_id: &str) -> Result<Option<FeeConfig>, AppError> {
        let url = format!("{}/fees/{}", self.base_url, biller_id);

        tracing::info!("Fetching fee config for biller {}", biller_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| AppError::RemoteCallError(format!("Fee config request failed: {}", e)))?;

        if !response.status().is_success() {
            tracing::warn!(
                "Fee config for biller {} returned non-success status; using defaults",
                biller_id
            );
            return Ok(None);
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::RemoteCallError(format!("Failed to parse fee config response: {}", e))
        })?;

        // Tolerate the data-wrapped layering here too.
        let record = body.get("data").cloned().unwrap_or(body);
        let fee: FeeConfig = serde_json::from_value(record).map_err(|e| {
            AppError::RemoteCallError(format!("Failed to parse fee config record: {}", e))
        })?;

        Ok(Some(fee))
    }
}

/// Accepts both a bare JSON array and the `{"data": [...]}` wrapper.
fn list_from_body<T: serde::de::DeserializeOwned>(
    body: Value,
    operation: &str,
) -> Result<Vec<T>, AppError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(ref map) if map.get("data").map(|d| d.is_array()).unwrap_or(false) => {
            map.get("data").cloned().unwrap_or(Value::Null)
        }
        other => {
            return Err(AppError::UnrecognizedResponseShape {
                operation: operation.to_string(),
                raw: other,
            })
        }
    };

    serde_json::from_value(list)
        .map_err(|e| AppError::RemoteCallError(format!("Failed to parse {} list: {}", operation, e)))
}
