//! Lists Amazon Bedrock foundation models and grants the calling principal the
//! IAM access needed to do so.
//!
//! See the Amazon Bedrock user guide for more information:
//!
//! - https://docs.aws.amazon.com/bedrock/latest/userguide/models-supported.html
//! - https://docs.aws.amazon.com/bedrock/latest/userguide/security-iam.html

pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod models;
pub mod permissions;

pub use config::{ClientArgs, ClientSettings, SetupSettings};
pub use error::{Error, FailureKind, Result};
pub use models::{print_models, ModelCatalog, ModelQuery, ModelSummary};
pub use permissions::{
    iam::AwsAccessControl, policy::PolicyDocument, AccessControl, Grant, PermissionSetup,
    PolicyAttachment, Principal,
};
