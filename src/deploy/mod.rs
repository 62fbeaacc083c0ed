//! Deployment step: react to a model-package-approved event by provisioning
//! a hosting model, an endpoint configuration, and a live endpoint.
//!
//! The three calls run in sequence with no rollback: a failure partway
//! through leaves the earlier resources in place for the operator to clean
//! up. The final call returns when the control plane acknowledges the
//! request, before the endpoint is serviceable.

pub mod control_plane;
pub mod event;

use thiserror::Error;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::config::{ConfigError, PipelineConfig};
use control_plane::{
    CaptureOption, ControlPlaneError, CreateEndpointConfigRequest, CreateEndpointRequest,
    CreateModelRequest, DataCaptureConfig, HostingControlPlane, PrimaryContainer,
    ProductionVariant,
};
use event::{DeploymentRequest, ModelPackageEvent};

/// Name prefix shared by every resource this step creates.
pub const BASE_NAME: &str = "loan-classification-xgboost";
const VARIANT_NAME: &str = "Alltraffic";
const INSTANCE_COUNT: u32 = 1;
const VARIANT_WEIGHT: u32 = 1;
const SAMPLING_PERCENTAGE: u32 = 100;

/// Errors produced by the deployment step.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Event is not valid JSON: {0}")]
    InvalidEvent(serde_json::Error),
    #[error("Event is missing required field {0}")]
    MissingField(&'static str),
    #[error("Event lists no supported realtime instance types")]
    NoInstanceTypes,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to format resource name timestamp: {0}")]
    FormatTimestamp(#[from] time::error::Format),
    #[error("control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),
}

/// The name triple for one deployment.
///
/// Names are qualified by the invocation minute, so two deployments within
/// the same minute collide on name. Accepted limitation of the naming
/// scheme, exercised by tests rather than guarded against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub model_name: String,
    pub endpoint_config_name: String,
    pub endpoint_name: String,
}

impl ResourceNames {
    /// Names for a given invocation time (UTC, minute granularity).
    pub fn for_timestamp(timestamp: OffsetDateTime) -> Result<Self, DeployError> {
        const SUFFIX_FORMAT: &[FormatItem<'_>] =
            format_description!("[month]-[day]-[hour]-[minute]");
        let suffix = timestamp.format(SUFFIX_FORMAT)?;
        Ok(Self {
            model_name: format!("{BASE_NAME}-model-{suffix}"),
            endpoint_config_name: format!("{BASE_NAME}-config-{suffix}"),
            endpoint_name: format!("{BASE_NAME}-endpoint-{suffix}"),
        })
    }
}

/// Run the deployment step against the current wall clock.
pub fn run(
    event: &ModelPackageEvent,
    config: &PipelineConfig,
    control_plane: &impl HostingControlPlane,
) -> Result<ResourceNames, DeployError> {
    run_at(event, config, control_plane, OffsetDateTime::now_utc())
}

/// Run the deployment step with an explicit invocation time.
pub fn run_at(
    event: &ModelPackageEvent,
    config: &PipelineConfig,
    control_plane: &impl HostingControlPlane,
    timestamp: OffsetDateTime,
) -> Result<ResourceNames, DeployError> {
    let request = DeploymentRequest::from_event(event)?;
    if config.execution_role_arn.is_empty() {
        return Err(ConfigError::MissingValue("execution_role_arn").into());
    }
    if config.capture_destination_uri.is_empty() {
        return Err(ConfigError::MissingValue("capture_destination_uri").into());
    }

    let names = ResourceNames::for_timestamp(timestamp)?;
    tracing::info!("model name - {}", names.model_name);
    tracing::info!("endpoint_config_name - {}", names.endpoint_config_name);
    tracing::info!("endpoint_name - {}", names.endpoint_name);
    tracing::info!("model_package_arn - {}", request.model_package_arn);
    tracing::info!("instance_type - {}", request.instance_type);

    control_plane.create_model(&CreateModelRequest {
        model_name: names.model_name.clone(),
        primary_container: PrimaryContainer {
            model_package_name: request.model_package_arn.clone(),
        },
        execution_role_arn: config.execution_role_arn.clone(),
    })?;

    control_plane.create_endpoint_config(&CreateEndpointConfigRequest {
        endpoint_config_name: names.endpoint_config_name.clone(),
        production_variants: vec![ProductionVariant {
            variant_name: VARIANT_NAME.to_string(),
            model_name: names.model_name.clone(),
            initial_instance_count: INSTANCE_COUNT,
            instance_type: request.instance_type.clone(),
            initial_variant_weight: VARIANT_WEIGHT,
        }],
        data_capture_config: DataCaptureConfig {
            enable_capture: true,
            initial_sampling_percentage: SAMPLING_PERCENTAGE,
            destination_s3_uri: config.capture_destination_uri.clone(),
            capture_options: vec![
                CaptureOption {
                    capture_mode: "Input".to_string(),
                },
                CaptureOption {
                    capture_mode: "Output".to_string(),
                },
            ],
        },
    })?;

    control_plane.create_endpoint(&CreateEndpointRequest {
        endpoint_name: names.endpoint_name.clone(),
        endpoint_config_name: names.endpoint_config_name.clone(),
    })?;

    Ok(names)
}
