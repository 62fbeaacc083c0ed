//! Hosting control-plane operations and the HTTP client behind them.
//!
//! The deploy step only issues three create calls; the trait keeps that
//! sequence testable against a recording fake while the HTTP implementation
//! speaks the platform's `x-amz-json-1.1` wire protocol. Request signing is
//! delegated to the deployment environment.

use std::sync::OnceLock;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced by control-plane calls.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("Failed to serialize {operation} request: {source}")]
    Serialize {
        operation: &'static str,
        source: serde_json::Error,
    },
    #[error("{operation} rejected with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("{operation} transport failure: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
}

/// `PrimaryContainer` block binding a model resource to its package.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PrimaryContainer {
    #[serde(rename = "ModelPackageName")]
    pub model_package_name: String,
}

/// CreateModel request body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateModelRequest {
    #[serde(rename = "ModelName")]
    pub model_name: String,
    #[serde(rename = "PrimaryContainer")]
    pub primary_container: PrimaryContainer,
    #[serde(rename = "ExecutionRoleArn")]
    pub execution_role_arn: String,
}

/// One traffic variant of an endpoint configuration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProductionVariant {
    #[serde(rename = "VariantName")]
    pub variant_name: String,
    #[serde(rename = "ModelName")]
    pub model_name: String,
    #[serde(rename = "InitialInstanceCount")]
    pub initial_instance_count: u32,
    #[serde(rename = "InstanceType")]
    pub instance_type: String,
    #[serde(rename = "InitialVariantWeight")]
    pub initial_variant_weight: u32,
}

/// A single capture mode entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CaptureOption {
    #[serde(rename = "CaptureMode")]
    pub capture_mode: String,
}

/// Request/response data capture settings for an endpoint configuration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DataCaptureConfig {
    #[serde(rename = "EnableCapture")]
    pub enable_capture: bool,
    #[serde(rename = "InitialSamplingPercentage")]
    pub initial_sampling_percentage: u32,
    #[serde(rename = "DestinationS3Uri")]
    pub destination_s3_uri: String,
    #[serde(rename = "CaptureOptions")]
    pub capture_options: Vec<CaptureOption>,
}

/// CreateEndpointConfig request body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateEndpointConfigRequest {
    #[serde(rename = "EndpointConfigName")]
    pub endpoint_config_name: String,
    #[serde(rename = "ProductionVariants")]
    pub production_variants: Vec<ProductionVariant>,
    #[serde(rename = "DataCaptureConfig")]
    pub data_capture_config: DataCaptureConfig,
}

/// CreateEndpoint request body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateEndpointRequest {
    #[serde(rename = "EndpointName")]
    pub endpoint_name: String,
    #[serde(rename = "EndpointConfigName")]
    pub endpoint_config_name: String,
}

/// The three provisioning operations the deploy step issues, in order.
pub trait HostingControlPlane {
    fn create_model(&self, request: &CreateModelRequest) -> Result<(), ControlPlaneError>;
    fn create_endpoint_config(
        &self,
        request: &CreateEndpointConfigRequest,
    ) -> Result<(), ControlPlaneError>;
    fn create_endpoint(&self, request: &CreateEndpointRequest) -> Result<(), ControlPlaneError>;
}

/// Control plane reached over HTTP with `x-amz-json-1.1` request bodies.
#[derive(Debug, Clone)]
pub struct HttpControlPlane {
    endpoint: String,
}

impl HttpControlPlane {
    /// Client posting to the given control-plane base URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn post(
        &self,
        operation: &'static str,
        body: &impl Serialize,
    ) -> Result<(), ControlPlaneError> {
        let body = serde_json::to_string(body)
            .map_err(|source| ControlPlaneError::Serialize { operation, source })?;
        let result = agent()
            .post(&self.endpoint)
            .set("X-Amz-Target", &format!("SageMaker.{operation}"))
            .set("Content-Type", "application/x-amz-json-1.1")
            .send_string(&body);
        match result {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(ControlPlaneError::Rejected {
                    operation,
                    status,
                    body,
                })
            }
            Err(err) => Err(ControlPlaneError::Transport {
                operation,
                message: err.to_string(),
            }),
        }
    }
}

impl HostingControlPlane for HttpControlPlane {
    fn create_model(&self, request: &CreateModelRequest) -> Result<(), ControlPlaneError> {
        self.post("CreateModel", request)
    }

    fn create_endpoint_config(
        &self,
        request: &CreateEndpointConfigRequest,
    ) -> Result<(), ControlPlaneError> {
        self.post("CreateEndpointConfig", request)
    }

    fn create_endpoint(&self, request: &CreateEndpointRequest) -> Result<(), ControlPlaneError> {
        self.post("CreateEndpoint", request)
    }
}

/// Shared HTTP agent with consistent timeouts.
fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build()
    })
}
