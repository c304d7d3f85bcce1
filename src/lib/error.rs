//! Errors surfaced by the lister and the permission helper.
//!
//! Nothing here is retried.  Every variant carries enough text for the
//! binaries to print a message plus a hint naming the likely cause.

use std::fmt::{Debug, Display};

use aws_sdk_bedrock::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// No credentials could be resolved from the environment, profile files
    /// or instance metadata.
    #[error("no usable AWS credentials: {0}")]
    Authentication(String),

    /// A configured value (region, principal shape) cannot be used.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A remote call failed.  `kind` only steers the hint text.
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        kind: FailureKind,
        message: String,
    },

    /// The principal is not allowed to change its own policies.
    #[error("not allowed to modify the policies of {principal}: {message}")]
    Permission { principal: String, message: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard output went away, e.g. piped into `head`.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl Error {
    /// One line naming the most likely cause, for humans.
    pub fn hint(&self) -> &'static str {
        match self {
            Error::Authentication(_) => {
                "configure credentials with `aws configure`, AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY or --aws-profile"
            }
            Error::Configuration(_) => {
                "check --region and the identity you are running as"
            }
            Error::Service { kind, .. } => kind.hint(),
            Error::Permission { .. } => {
                "ask an administrator to grant Bedrock access, or to allow iam:AttachUserPolicy/iam:PutUserPolicy on your identity"
            }
            Error::Io { .. } | Error::Json(_) => "check the --write-policy path",
            Error::Output(_) => "the reader of standard output stopped early",
        }
    }

    /// True when the reader of stdout closed the pipe; nothing is wrong
    /// with AWS in that case.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Error::Output(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }

    /// Cause of a failed remote call, if this is one.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Error::Service { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True when the remote service refused the caller.
    pub fn is_access_denied(&self) -> bool {
        self.failure_kind() == Some(FailureKind::AccessDenied)
    }
}

/// Coarse cause of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    AccessDenied,
    /// Credentials were found but are wrong or expired.
    Credentials,
    Throttled,
    Transport,
    Other,
}

impl FailureKind {
    /// Classifies an AWS error code.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(
                "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation",
            ) => FailureKind::AccessDenied,
            Some(
                "UnrecognizedClientException"
                | "InvalidClientTokenId"
                | "ExpiredToken"
                | "ExpiredTokenException"
                | "SignatureDoesNotMatch",
            ) => FailureKind::Credentials,
            Some(
                "Throttling"
                | "ThrottlingException"
                | "TooManyRequestsException"
                | "RequestLimitExceeded"
                | "ServiceQuotaExceededException",
            ) => FailureKind::Throttled,
            _ => FailureKind::Other,
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            FailureKind::AccessDenied => {
                "your identity lacks Bedrock permissions; run `apply-permissions` or ask an administrator"
            }
            FailureKind::Credentials => {
                "your credentials are invalid or expired; update them with `aws configure`, AWS_* variables or --aws-profile"
            }
            FailureKind::Throttled => "the service is throttling requests; try again shortly",
            FailureKind::Transport => {
                "could not reach the service; check the network and that Bedrock is available in --region"
            }
            FailureKind::Other => "see the error above; Bedrock may not be available in --region",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FailureKind::AccessDenied => "access denied",
            FailureKind::Credentials => "bad credentials",
            FailureKind::Throttled => "throttled",
            FailureKind::Transport => "transport",
            FailureKind::Other => "other",
        })
    }
}

/// Converts any AWS SDK error into [`Error::Service`].
///
/// All service crates share the same smithy `SdkError`, so this works for
/// the Bedrock, IAM and STS clients alike.
pub(crate) fn service_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    let kind = match &err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => FailureKind::Transport,
        _ => FailureKind::from_code(err.code()),
    };
    let message = DisplayErrorContext(&err).to_string();
    tracing::debug!(operation, %kind, "remote call failed");
    Error::Service {
        operation,
        kind,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_codes() {
        assert_eq!(
            FailureKind::from_code(Some("AccessDeniedException")),
            FailureKind::AccessDenied
        );
        assert_eq!(
            FailureKind::from_code(Some("AccessDenied")),
            FailureKind::AccessDenied
        );
        assert_eq!(
            FailureKind::from_code(Some("ThrottlingException")),
            FailureKind::Throttled
        );
        assert_eq!(
            FailureKind::from_code(Some("ValidationException")),
            FailureKind::Other
        );
        assert_eq!(FailureKind::from_code(None), FailureKind::Other);
    }

    #[test]
    fn hints_follow_kind() {
        let denied = Error::Service {
            operation: "ListFoundationModels",
            kind: FailureKind::AccessDenied,
            message: "nope".into(),
        };
        assert!(denied.is_access_denied());
        assert!(denied.hint().contains("apply-permissions"));
        assert_eq!(denied.to_string(), "ListFoundationModels failed: nope");

        let throttled = Error::Service {
            operation: "ListFoundationModels",
            kind: FailureKind::Throttled,
            message: "slow down".into(),
        };
        assert!(!throttled.is_access_denied());
        assert!(throttled.hint().contains("throttling"));
    }

    #[test]
    fn bad_credentials_are_not_a_permission_problem() {
        for code in [
            "UnrecognizedClientException",
            "InvalidClientTokenId",
            "ExpiredToken",
            "ExpiredTokenException",
            "SignatureDoesNotMatch",
        ] {
            let kind = FailureKind::from_code(Some(code));
            assert_eq!(kind, FailureKind::Credentials, "{code}");

            let err = Error::Service {
                operation: "GetCallerIdentity",
                kind,
                message: code.to_string(),
            };
            assert!(!err.is_access_denied(), "{code}");
            assert!(err.hint().contains("credentials"), "{code}");
            assert!(!err.hint().contains("apply-permissions"), "{code}");
        }
    }

    #[test]
    fn broken_pipe() {
        let err = Error::Output(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(err.is_broken_pipe());
        assert!(!err.hint().contains("--write-policy"));

        let err = Error::Output(std::io::Error::from(std::io::ErrorKind::Other));
        assert!(!err.is_broken_pipe());

        let err = Error::Io {
            path: "/tmp/x".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
        };
        assert!(!err.is_broken_pipe());
    }
}
