//! Library exports for the pipeline step binaries and integration tests.
/// Pipeline configuration loading.
pub mod config;
/// Endpoint provisioning from model-package events.
pub mod deploy;
/// Model evaluation and report emission.
pub mod evaluate;
/// Logging setup shared by the step binaries.
pub mod logging;
/// Raw dataset cleaning, encoding, and splitting.
pub mod preprocess;
/// CSV tables with column dtype inference.
pub mod table;
