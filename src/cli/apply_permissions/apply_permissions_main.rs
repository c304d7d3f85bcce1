//! Grants the calling IAM user or role access to Amazon Bedrock
//!
//! See:
//! https://docs.aws.amazon.com/bedrock/latest/userguide/security-iam-awsmanpol.html
//! https://docs.aws.amazon.com/IAM/latest/UserGuide/access_policies_manage-attach-detach.html

use std::process::ExitCode;

use bedrock_access::{
    client,
    config::{DEFAULT_INLINE_POLICY_NAME, DEFAULT_POLICY_ARN, DEFAULT_SAMPLE},
    file, logging, AwsAccessControl, ClientArgs, ClientSettings, PermissionSetup,
    PolicyDocument, SetupSettings,
};
use clap::Parser;

/// Attach Bedrock permissions to the calling principal, then check they work
///
/// Steps:
///     1/ Inspect: resolve the caller with sts:GetCallerIdentity and list its policies.
///     2/ Ensure: attach the managed policy unless it (or the inline fallback) is
///        already there.  When attaching is denied, put an inline policy instead.
///     3/ Verify: call bedrock:ListFoundationModels.
///
/// Safe to run repeatedly.  Exits non-zero unless the verification call succeeds.
///
/// Example:
///     apply-permissions -p dev --write-policy ~/bedrock-full-access-policy.json
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, verbatim_doc_comment)]
struct CliArgs {
    #[clap(flatten)]
    client: ClientArgs,

    /// Managed policy to attach
    #[clap(long, env = "BEDROCK_ACCESS_POLICY_ARN", default_value = DEFAULT_POLICY_ARN)]
    policy_arn: String,

    /// Name of the inline policy used when attaching is denied
    #[clap(long, env = "BEDROCK_ACCESS_INLINE_POLICY", default_value = DEFAULT_INLINE_POLICY_NAME)]
    inline_policy_name: String,

    /// Never fall back to an inline policy
    #[clap(long)]
    no_inline_fallback: bool,

    /// Also save the inline policy document to this file (supports ~ and env variables)
    #[clap(long)]
    write_policy: Option<String>,

    /// How many models to echo after a successful verification
    #[clap(long, default_value_t = DEFAULT_SAMPLE)]
    sample: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();
    logging::init(cli.client.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("hint: {}", err.hint());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CliArgs) -> bedrock_access::Result<()> {
    if let Some(path) = &cli.write_policy {
        let document = PolicyDocument::bedrock_full_access().to_json_pretty()?;
        let written = file::write(path, &document)?;
        println!("Policy document saved to: {}", written);
    }

    let settings = SetupSettings {
        policy_arn: cli.policy_arn,
        inline_policy_name: cli.inline_policy_name,
        inline_fallback: !cli.no_inline_fallback,
        sample: cli.sample,
        ..SetupSettings::default()
    };
    let client_settings = ClientSettings::from(cli.client);

    let config = client::load_config(&client_settings).await?;
    let access = AwsAccessControl::new(&config);
    let cpclient = client::new_controlplane_client(&config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    PermissionSetup::new(&access, &cpclient, &settings)
        .run(&mut out)
        .await?;
    Ok(())
}
