//! Typed view of the model-package-approved event that triggers deployment.
//!
//! The payload is deserialized permissively and then validated at the
//! boundary, so an absent field fails with the dotted path that is missing
//! instead of a generic lookup error deep in the call sequence.

use serde::Deserialize;

use super::DeployError;

/// Raw inbound event; every field is optional until validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelPackageEvent {
    #[serde(default)]
    pub detail: Option<EventDetail>,
}

/// `detail` block of the event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDetail {
    #[serde(rename = "ModelPackageArn", default)]
    pub model_package_arn: Option<String>,
    #[serde(rename = "InferenceSpecification", default)]
    pub inference_specification: Option<InferenceSpecification>,
}

/// `detail.InferenceSpecification` block of the event.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceSpecification {
    #[serde(rename = "SupportedRealtimeInferenceInstanceTypes", default)]
    pub supported_realtime_inference_instance_types: Vec<String>,
}

impl ModelPackageEvent {
    /// Parse an event document from JSON.
    pub fn from_json(body: &str) -> Result<Self, DeployError> {
        serde_json::from_str(body).map_err(DeployError::InvalidEvent)
    }
}

/// Validated deployment parameters extracted from an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    /// Registered model package to deploy.
    pub model_package_arn: String,
    /// First supported realtime instance type.
    pub instance_type: String,
}

impl DeploymentRequest {
    /// Validate the event shape and pull out the required fields.
    pub fn from_event(event: &ModelPackageEvent) -> Result<Self, DeployError> {
        let detail = event
            .detail
            .as_ref()
            .ok_or(DeployError::MissingField("detail"))?;
        let model_package_arn = detail
            .model_package_arn
            .as_deref()
            .filter(|arn| !arn.is_empty())
            .ok_or(DeployError::MissingField("detail.ModelPackageArn"))?;
        let spec = detail
            .inference_specification
            .as_ref()
            .ok_or(DeployError::MissingField("detail.InferenceSpecification"))?;
        let instance_type = spec
            .supported_realtime_inference_instance_types
            .first()
            .ok_or(DeployError::NoInstanceTypes)?;
        Ok(Self {
            model_package_arn: model_package_arn.to_string(),
            instance_type: instance_type.clone(),
        })
    }
}
