//! IAM policy documents.
//!
//! See: https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_policies_grammar.html
//!
//! Field names follow the IAM JSON grammar, hence the PascalCase renames.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Policy language version, fixed by IAM.
pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: Effect,
    pub action: Vec<String>,
    pub resource: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
}

impl Statement {
    fn allow_all(action: &str) -> Self {
        Statement {
            effect: Effect::Allow,
            action: vec![action.to_string()],
            resource: "*".to_string(),
        }
    }
}

impl PolicyDocument {
    /// Everything under `bedrock:*` and `bedrock-runtime:*`, on any resource.
    pub fn bedrock_full_access() -> Self {
        PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![
                Statement::allow_all("bedrock:*"),
                Statement::allow_all("bedrock-runtime:*"),
            ],
        }
    }

    /// Compact form, as sent to PutUserPolicy/PutRolePolicy.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
