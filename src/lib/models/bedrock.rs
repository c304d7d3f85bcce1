//! [`ModelCatalog`] backed by the Bedrock control plane.
//!
//! https://docs.rs/aws-sdk-bedrock/latest/aws_sdk_bedrock/struct.Client.html#method.list_foundation_models

use async_trait::async_trait;
use aws_sdk_bedrock::types::FoundationModelSummary;

use super::{ModelCatalog, ModelQuery, ModelSummary};
use crate::error::{service_error, Result};

#[async_trait]
impl ModelCatalog for aws_sdk_bedrock::Client {
    async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSummary>> {
        tracing::debug!(provider = ?query.provider, "ListFoundationModels");
        let output = self
            .list_foundation_models()
            .set_by_provider(query.provider.clone())
            .send()
            .await
            .map_err(|e| service_error("ListFoundationModels", e))?;

        let models = output
            .model_summaries
            .unwrap_or_default()
            .iter()
            .map(ModelSummary::from)
            .collect::<Vec<_>>();
        tracing::debug!(count = models.len(), "listed foundation models");
        Ok(models)
    }
}

impl From<&FoundationModelSummary> for ModelSummary {
    fn from(model: &FoundationModelSummary) -> Self {
        ModelSummary {
            model_id: model.model_id().to_owned(),
            provider_name: model.provider_name().unwrap_or_default().to_owned(),
            model_name: model.model_name().unwrap_or_default().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_names_render_empty() {
        let summary = FoundationModelSummary::builder()
            .model_arn("arn:aws:bedrock:us-west-2::foundation-model/anthropic.claude-v2")
            .model_id("anthropic.claude-v2")
            .build()
            .unwrap();

        let model = ModelSummary::from(&summary);
        assert_eq!(model, ModelSummary::new("anthropic.claude-v2", "", ""));
    }

    #[test]
    fn copies_fields() {
        let summary = FoundationModelSummary::builder()
            .model_arn("arn:aws:bedrock:us-west-2::foundation-model/amazon.titan-text-express-v1")
            .model_id("amazon.titan-text-express-v1")
            .provider_name("Amazon")
            .model_name("Titan Text G1 - Express")
            .build()
            .unwrap();

        let model = ModelSummary::from(&summary);
        assert_eq!(
            model,
            ModelSummary::new("amazon.titan-text-express-v1", "Amazon", "Titan Text G1 - Express")
        );
    }
}
