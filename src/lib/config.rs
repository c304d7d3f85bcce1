//! Settings shared by the binaries.
//!
//! The region and policy identifiers are environment specific, so each one is
//! a flag with an environment override and a documented default.

use clap::Args;

use crate::models::ModelQuery;

/// Region the clients are bound to unless overridden.
pub const DEFAULT_REGION: &str = "us-west-2";

/// AWS managed policy granting full Bedrock access.
pub const DEFAULT_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonBedrockFullAccess";

/// Name used for the inline fallback policy.
pub const DEFAULT_INLINE_POLICY_NAME: &str = "BedrockFullAccess";

/// Number of models echoed after a successful verification.
pub const DEFAULT_SAMPLE: usize = 3;

/// Where the clients look for region and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub region: String,
    pub aws_profile: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            aws_profile: None,
        }
    }
}

/// What the permission helper ensures and how it verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupSettings {
    pub policy_arn: String,
    pub inline_policy_name: String,
    pub inline_fallback: bool,
    pub sample: usize,
    pub query: ModelQuery,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            policy_arn: DEFAULT_POLICY_ARN.to_string(),
            inline_policy_name: DEFAULT_INLINE_POLICY_NAME.to_string(),
            inline_fallback: true,
            sample: DEFAULT_SAMPLE,
            query: ModelQuery::default(),
        }
    }
}

impl SetupSettings {
    /// Display name of the managed policy, i.e. the last ARN segment.
    pub fn policy_name(&self) -> &str {
        self.policy_arn
            .rsplit('/')
            .next()
            .unwrap_or(self.policy_arn.as_str())
    }
}

/// Client flags, flattened into each binary's arguments.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// AWS profile override
    ///
    /// AWS credentials are selected in the following sequence:
    ///
    /// 1/ Explicit Override:
    ///   When this --aws-profile option is specified, the named profile will be read from
    ///   ~/.aws/config and ~/.aws/credentials.
    ///
    /// 2/ Environment Variables, as described here:
    ///
    ///   https://docs.aws.amazon.com/cli/v1/userguide/cli-configure-envvars.html
    ///
    /// 3/ Default profile:
    ///   Uses the default profile from ~/.aws/config and ~/.aws/credentials.
    ///
    /// See the AWS docs for more information:
    ///
    ///   https://docs.aws.amazon.com/sdkref/latest/guide/file-format.html
    ///   https://docs.aws.amazon.com/sdk-for-rust/latest/dg/credproviders.html
    #[clap(short = 'p', long, verbatim_doc_comment)]
    pub aws_profile: Option<String>,

    /// Region to call Bedrock in
    ///
    /// Always wins over the region of the selected profile.
    ///
    ///   https://docs.aws.amazon.com/bedrock/latest/userguide/models-regions.html
    #[clap(long, env = "BEDROCK_ACCESS_REGION", default_value = DEFAULT_REGION, verbatim_doc_comment)]
    pub region: String,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[clap(short, long)]
    pub verbose: bool,
}

impl From<ClientArgs> for ClientSettings {
    fn from(value: ClientArgs) -> Self {
        ClientSettings {
            region: value.region,
            aws_profile: value.aws_profile,
        }
    }
}
