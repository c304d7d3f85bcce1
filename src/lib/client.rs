//! Builds the AWS clients.
//!
//! Every client comes from one [`SdkConfig`] whose credentials have already
//! been resolved once, so a missing credential shows up as
//! [`Error::Authentication`] instead of a failed service call.

use aws_config::{retry::RetryConfig, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_bedrock::error::DisplayErrorContext;

use crate::{
    config::ClientSettings,
    error::{Error, Result},
};

/// Loads the shared config for `settings`.
///
/// Region always comes from `settings`, even when a profile is named.
pub async fn load_config(settings: &ClientSettings) -> Result<SdkConfig> {
    validate_region(&settings.region)?;

    // Wire up SdkConfig:
    // https://docs.rs/aws-config/latest/aws_config/
    // https://docs.aws.amazon.com/sdk-for-rust/latest/dg/configure.html
    // https://docs.aws.amazon.com/sdk-for-rust/latest/dg/credproviders.html
    // https://docs.rs/aws-config/latest/aws_config/profile/credentials/struct.ProfileFileCredentialsProvider.html
    let mut loader = aws_config::from_env().region(Region::new(settings.region.clone()));
    if let Some(profile) = settings.aws_profile.clone() {
        loader = loader.credentials_provider(
            aws_config::profile::ProfileFileCredentialsProvider::builder()
                .profile_name(profile)
                .build(),
        );
    }
    let config = loader.load().await;

    let provider = config.credentials_provider().ok_or_else(|| {
        Error::Authentication("no credentials provider could be configured".to_string())
    })?;
    provider
        .provide_credentials()
        .await
        .map_err(|e| Error::Authentication(DisplayErrorContext(&e).to_string()))?;
    tracing::debug!(region = %settings.region, profile = ?settings.aws_profile, "resolved credentials");

    Ok(config)
}

/// Bedrock control plane client with SDK retries switched off, so a failed
/// listing surfaces after exactly one attempt.
///
/// https://docs.rs/aws-sdk-bedrock/latest/aws_sdk_bedrock/
pub fn new_controlplane_client(config: &SdkConfig) -> aws_sdk_bedrock::Client {
    let config = config
        .to_builder()
        .retry_config(RetryConfig::disabled())
        .build();
    aws_sdk_bedrock::Client::new(&config)
}

/// https://docs.rs/aws-sdk-iam/latest/aws_sdk_iam/
pub fn new_iam_client(config: &SdkConfig) -> aws_sdk_iam::Client {
    aws_sdk_iam::Client::new(config)
}

/// https://docs.rs/aws-sdk-sts/latest/aws_sdk_sts/
pub fn new_sts_client(config: &SdkConfig) -> aws_sdk_sts::Client {
    aws_sdk_sts::Client::new(config)
}

/// Checks the shape of a region identifier such as `us-west-2` or
/// `us-gov-west-1`.
///
/// Whether Bedrock is actually offered there is only known to the service.
pub fn validate_region(region: &str) -> Result<()> {
    let invalid = || Error::Configuration(format!("`{region}` is not a valid AWS region"));

    let well_formed_chars = region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let starts_with_letter = region.starts_with(|c: char| c.is_ascii_lowercase());
    let ends_with_digit = region.ends_with(|c: char| c.is_ascii_digit());
    if !(well_formed_chars && starts_with_letter && ends_with_digit) {
        return Err(invalid());
    }

    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions() {
        for ok in ["us-west-2", "eu-central-1", "ap-northeast-3", "us-gov-west-1"] {
            assert!(validate_region(ok).is_ok(), "{ok}");
        }
        for bad in ["", "us-west", "US-WEST-2", "us--west-2", "-us-west-2", "us_west_2", "2-us-west"] {
            assert!(
                matches!(validate_region(bad), Err(Error::Configuration(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn controlplane_client_makes_a_single_attempt() {
        let config = SdkConfig::builder()
            .region(Region::new("us-west-2"))
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();

        let client = new_controlplane_client(&config);
        let retry = client.config().retry_config().unwrap();
        assert_eq!(retry.max_attempts(), 1);
    }

    #[tokio::test]
    async fn bad_region_fails_before_loading() {
        let settings = ClientSettings {
            region: "nowhere".to_string(),
            aws_profile: None,
        };
        let err = load_config(&settings).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{err:?}");
    }
}
