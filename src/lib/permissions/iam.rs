//! [`AccessControl`] backed by STS and IAM.
//!
//! - https://docs.rs/aws-sdk-sts/latest/aws_sdk_sts/struct.Client.html#method.get_caller_identity
//! - https://docs.rs/aws-sdk-iam/latest/aws_sdk_iam/struct.Client.html
//!
//! IAM is a global service, so the region of the shared config doesn't matter
//! here beyond picking the partition.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iam::types::AttachedPolicy as IamAttachedPolicy;

use super::{AccessControl, AttachedPolicy, CallerIdentity, Principal};
use crate::{
    client::{new_iam_client, new_sts_client},
    error::{service_error, Error, Result},
};

pub struct AwsAccessControl {
    sts: aws_sdk_sts::Client,
    iam: aws_sdk_iam::Client,
}

impl AwsAccessControl {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            sts: new_sts_client(config),
            iam: new_iam_client(config),
        }
    }
}

#[async_trait]
impl AccessControl for AwsAccessControl {
    async fn caller_identity(&self) -> Result<CallerIdentity> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| service_error("GetCallerIdentity", e))?;

        let arn = output.arn().ok_or_else(|| {
            Error::Configuration("GetCallerIdentity returned no ARN".to_string())
        })?;
        Ok(CallerIdentity {
            account: output.account().unwrap_or_default().to_owned(),
            arn: arn.to_owned(),
            user_id: output.user_id().unwrap_or_default().to_owned(),
        })
    }

    async fn attached_policies(&self, principal: &Principal) -> Result<Vec<AttachedPolicy>> {
        let policies = match principal {
            Principal::User(name) => {
                self.iam
                    .list_attached_user_policies()
                    .user_name(name)
                    .send()
                    .await
                    .map_err(|e| service_error("ListAttachedUserPolicies", e))?
                    .attached_policies
            }
            Principal::Role(name) => {
                self.iam
                    .list_attached_role_policies()
                    .role_name(name)
                    .send()
                    .await
                    .map_err(|e| service_error("ListAttachedRolePolicies", e))?
                    .attached_policies
            }
        };
        Ok(policies
            .unwrap_or_default()
            .iter()
            .map(AttachedPolicy::from)
            .collect())
    }

    async fn inline_policy_names(&self, principal: &Principal) -> Result<Vec<String>> {
        let names = match principal {
            Principal::User(name) => self
                .iam
                .list_user_policies()
                .user_name(name)
                .send()
                .await
                .map_err(|e| service_error("ListUserPolicies", e))?
                .policy_names()
                .to_vec(),
            Principal::Role(name) => self
                .iam
                .list_role_policies()
                .role_name(name)
                .send()
                .await
                .map_err(|e| service_error("ListRolePolicies", e))?
                .policy_names()
                .to_vec(),
        };
        Ok(names)
    }

    async fn attach_policy(&self, principal: &Principal, policy_arn: &str) -> Result<()> {
        tracing::debug!(%principal, policy_arn, "attaching managed policy");
        match principal {
            Principal::User(name) => {
                self.iam
                    .attach_user_policy()
                    .user_name(name)
                    .policy_arn(policy_arn)
                    .send()
                    .await
                    .map_err(|e| service_error("AttachUserPolicy", e))?;
            }
            Principal::Role(name) => {
                self.iam
                    .attach_role_policy()
                    .role_name(name)
                    .policy_arn(policy_arn)
                    .send()
                    .await
                    .map_err(|e| service_error("AttachRolePolicy", e))?;
            }
        }
        Ok(())
    }

    async fn put_inline_policy(
        &self,
        principal: &Principal,
        policy_name: &str,
        document: &str,
    ) -> Result<()> {
        tracing::debug!(%principal, policy_name, "putting inline policy");
        match principal {
            Principal::User(name) => {
                self.iam
                    .put_user_policy()
                    .user_name(name)
                    .policy_name(policy_name)
                    .policy_document(document)
                    .send()
                    .await
                    .map_err(|e| service_error("PutUserPolicy", e))?;
            }
            Principal::Role(name) => {
                self.iam
                    .put_role_policy()
                    .role_name(name)
                    .policy_name(policy_name)
                    .policy_document(document)
                    .send()
                    .await
                    .map_err(|e| service_error("PutRolePolicy", e))?;
            }
        }
        Ok(())
    }
}

impl From<&IamAttachedPolicy> for AttachedPolicy {
    fn from(policy: &IamAttachedPolicy) -> Self {
        AttachedPolicy {
            policy_name: policy.policy_name().unwrap_or_default().to_owned(),
            policy_arn: policy.policy_arn().unwrap_or_default().to_owned(),
        }
    }
}
