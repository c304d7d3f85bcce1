//! Grants the calling principal access to Bedrock.
//!
//! Runs three steps, in order, never looping back:
//!
//! 1. inspect: who is calling and what is already attached
//! 2. ensure: attach the managed policy unless a grant already exists,
//!    falling back to an inline policy when attaching fails
//! 3. verify: list the models again
//!
//! Nothing is rolled back on failure.  Every step is safe to repeat, so the
//! fix for a half-finished run is to run it again.

pub mod iam;
pub mod policy;

use std::{fmt::Display, io::Write};

use async_trait::async_trait;

use crate::{
    config::SetupSettings,
    error::{Error, FailureKind, Result},
    models::{write_models, ModelCatalog, ModelSummary},
};
use policy::PolicyDocument;

/// Result of STS GetCallerIdentity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
    pub user_id: String,
}

/// The IAM entity that policies get attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User(String),
    Role(String),
}

impl Principal {
    /// Derives the principal from a caller ARN.
    ///
    /// Assumed-role sessions map to their role.  The account root and
    /// federated users have nothing to attach policies to.
    pub fn from_arn(arn: &str) -> Result<Self> {
        let unsupported =
            || Error::Configuration(format!("cannot attach policies to the principal `{arn}`"));

        let mut parts = arn.splitn(6, ':');
        let (Some("arn"), Some(_partition), Some(service), Some(_region), Some(_account), Some(resource)) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(unsupported());
        };

        let (kind, rest) = resource.split_once('/').ok_or_else(unsupported)?;
        let principal = match (service, kind) {
            // arn:aws:iam::123456789012:user/division/alice
            ("iam", "user") => rest.rsplit('/').next().map(|n| Principal::User(n.to_string())),
            // arn:aws:iam::123456789012:role/service-role/builder
            ("iam", "role") => rest.rsplit('/').next().map(|n| Principal::Role(n.to_string())),
            // arn:aws:sts::123456789012:assumed-role/builder/session-name
            ("sts", "assumed-role") => rest.split('/').next().map(|n| Principal::Role(n.to_string())),
            _ => None,
        };
        match principal {
            Some(Principal::User(name) | Principal::Role(name)) if name.is_empty() => {
                Err(unsupported())
            }
            Some(principal) => Ok(principal),
            None => Err(unsupported()),
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::User(name) => write!(f, "user {}", name),
            Principal::Role(name) => write!(f, "role {}", name),
        }
    }
}

/// A managed policy attached to a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedPolicy {
    pub policy_name: String,
    pub policy_arn: String,
}

/// The grant the helper makes sure exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyAttachment {
    pub policy_name: String,
    /// `None` for inline policies, which have no ARN of their own.
    pub policy_arn: Option<String>,
    pub principal: Principal,
}

/// What the ensure step found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    AlreadyAttached,
    AlreadyInline,
    Attached,
    InlineApplied,
}

impl Grant {
    /// True when this run changed IAM state.
    pub fn changed(self) -> bool {
        matches!(self, Grant::Attached | Grant::InlineApplied)
    }
}

/// The IAM and STS operations the helper needs.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn caller_identity(&self) -> Result<CallerIdentity>;

    async fn attached_policies(&self, principal: &Principal) -> Result<Vec<AttachedPolicy>>;

    async fn inline_policy_names(&self, principal: &Principal) -> Result<Vec<String>>;

    /// Attaching an already attached policy succeeds without change.
    async fn attach_policy(&self, principal: &Principal, policy_arn: &str) -> Result<()>;

    /// Creates or replaces the named inline policy.
    async fn put_inline_policy(
        &self,
        principal: &Principal,
        policy_name: &str,
        document: &str,
    ) -> Result<()>;
}

/// Output of the inspect step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub identity: CallerIdentity,
    pub principal: Principal,
    pub attached: Vec<AttachedPolicy>,
    pub inline: Vec<String>,
}

impl Inspection {
    pub fn has_managed(&self, policy_arn: &str) -> bool {
        self.attached.iter().any(|p| p.policy_arn == policy_arn)
    }

    pub fn has_inline(&self, policy_name: &str) -> bool {
        self.inline.iter().any(|n| n == policy_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub attachment: PolicyAttachment,
    pub grant: Grant,
    pub models: Vec<ModelSummary>,
}

pub struct PermissionSetup<'a, A: ?Sized, C: ?Sized> {
    access: &'a A,
    catalog: &'a C,
    settings: &'a SetupSettings,
}

impl<'a, A, C> PermissionSetup<'a, A, C>
where
    A: AccessControl + ?Sized,
    C: ModelCatalog + ?Sized,
{
    pub fn new(access: &'a A, catalog: &'a C, settings: &'a SetupSettings) -> Self {
        Self {
            access,
            catalog,
            settings,
        }
    }

    /// Runs inspect, ensure and verify, reporting progress to `out`.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<SetupReport> {
        let inspection = self.inspect().await?;
        say(out, format_args!("Account: {}", inspection.identity.account))?;
        say(
            out,
            format_args!(
                "Caller: {} ({})",
                inspection.identity.arn, inspection.identity.user_id
            ),
        )?;
        say(out, format_args!("Principal: {}", inspection.principal))?;
        print_policies(out, &inspection.attached, &inspection.inline)?;

        let (attachment, grant) = self.ensure(&inspection).await?;
        match grant {
            Grant::AlreadyAttached | Grant::AlreadyInline => say(
                out,
                format_args!(
                    "{} already grants Bedrock access to {}; nothing to change",
                    attachment.policy_name, attachment.principal
                ),
            )?,
            Grant::Attached => say(
                out,
                format_args!(
                    "Attached {} to {}",
                    attachment.policy_name, attachment.principal
                ),
            )?,
            Grant::InlineApplied => say(
                out,
                format_args!(
                    "Applied inline policy {} to {}",
                    attachment.policy_name, attachment.principal
                ),
            )?,
        }

        if grant.changed() {
            let (attached, inline) = self.policies(&inspection.principal).await?;
            say(out, format_args!("Policies now on {}:", inspection.principal))?;
            print_policies(out, &attached, &inline)?;
        }

        let models = match self.verify().await {
            Ok(models) => models,
            Err(err) => {
                if grant.changed() {
                    say(
                        out,
                        "Verification failed right after changing IAM; changes can take a few seconds to propagate, run again shortly",
                    )?;
                }
                return Err(err);
            }
        };
        say(
            out,
            format_args!("Bedrock access verified: {} models listed", models.len()),
        )?;
        write_models(models.iter().take(self.settings.sample), out)?;

        Ok(SetupReport {
            attachment,
            grant,
            models,
        })
    }

    /// Resolves the principal and lists its policies.
    ///
    /// A denied listing is tolerated: the grant may still be attachable, and
    /// attaching twice is harmless.
    pub async fn inspect(&self) -> Result<Inspection> {
        let identity = self.access.caller_identity().await?;
        let principal = Principal::from_arn(&identity.arn)?;
        tracing::info!(%principal, account = %identity.account, "resolved caller");

        let (attached, inline) = self.policies(&principal).await?;

        Ok(Inspection {
            identity,
            principal,
            attached,
            inline,
        })
    }

    /// Managed and inline policies of `principal`; denied listings come
    /// back empty.
    async fn policies(&self, principal: &Principal) -> Result<(Vec<AttachedPolicy>, Vec<String>)> {
        let attached = tolerate_denied(
            "attached policies",
            self.access.attached_policies(principal).await,
        )?;
        let inline = tolerate_denied(
            "inline policies",
            self.access.inline_policy_names(principal).await,
        )?;
        Ok((attached, inline))
    }

    /// Makes sure a Bedrock grant exists for the inspected principal.
    ///
    /// Any failed attach other than a transport error (denied, the managed
    /// policy quota reached, ...) moves on to the inline policy when the
    /// fallback is enabled.
    pub async fn ensure(&self, inspection: &Inspection) -> Result<(PolicyAttachment, Grant)> {
        let settings = self.settings;
        let principal = &inspection.principal;
        let managed = PolicyAttachment {
            policy_name: settings.policy_name().to_string(),
            policy_arn: Some(settings.policy_arn.clone()),
            principal: principal.clone(),
        };
        let inline = PolicyAttachment {
            policy_name: settings.inline_policy_name.clone(),
            policy_arn: None,
            principal: principal.clone(),
        };

        if inspection.has_managed(&settings.policy_arn) {
            return Ok((managed, Grant::AlreadyAttached));
        }
        if settings.inline_fallback && inspection.has_inline(&settings.inline_policy_name) {
            return Ok((inline, Grant::AlreadyInline));
        }

        let attach_err = match self
            .access
            .attach_policy(principal, &settings.policy_arn)
            .await
        {
            Ok(()) => return Ok((managed, Grant::Attached)),
            Err(err) if err.failure_kind() == Some(FailureKind::Transport) => return Err(err),
            Err(err) => err,
        };
        tracing::warn!(%principal, "attaching {} failed: {attach_err}", settings.policy_arn);

        if !settings.inline_fallback {
            if attach_err.is_access_denied() {
                return Err(Error::Permission {
                    principal: principal.to_string(),
                    message: attach_err.to_string(),
                });
            }
            return Err(attach_err);
        }

        let document = PolicyDocument::bedrock_full_access().to_json()?;
        match self
            .access
            .put_inline_policy(principal, &settings.inline_policy_name, &document)
            .await
        {
            Ok(()) => Ok((inline, Grant::InlineApplied)),
            Err(err) if err.is_access_denied() => Err(Error::Permission {
                principal: principal.to_string(),
                message: format!("{attach_err}; {err}"),
            }),
            Err(err) => Err(err),
        }
    }

    /// Lists the models once with the current grants.
    pub async fn verify(&self) -> Result<Vec<ModelSummary>> {
        self.catalog.list_models(&self.settings.query).await
    }
}

fn tolerate_denied<T: Default>(what: &str, result: Result<T>) -> Result<T> {
    match result {
        Err(err) if err.is_access_denied() => {
            tracing::warn!("could not list {what}, continuing: {err}");
            Ok(T::default())
        }
        other => other,
    }
}

fn print_policies<W: Write>(out: &mut W, attached: &[AttachedPolicy], inline: &[String]) -> Result<()> {
    for policy in attached {
        say(
            out,
            format_args!("Attached policy: {} ({})", policy.policy_name, policy.policy_arn),
        )?;
    }
    for name in inline {
        say(out, format_args!("Inline policy: {}", name))?;
    }
    Ok(())
}

fn say<W: Write>(out: &mut W, line: impl Display) -> Result<()> {
    writeln!(out, "{}", line).map_err(Error::Output)
}
