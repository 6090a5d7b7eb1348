//! Connector configuration and validation
//!
//! Typed settings for the chain-walking connector together with the
//! validation rules shared by every configuration surface of the crate.

pub mod connector;
pub mod validation;

pub use connector::{ConnectorConfig, DEFAULT_CONNECT_TIMEOUT};
pub use validation::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
