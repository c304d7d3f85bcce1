//! Listing foundation models.
//!
//! See:
//! - https://docs.aws.amazon.com/bedrock/latest/APIReference/API_ListFoundationModels.html
//! - https://docs.aws.amazon.com/bedrock/latest/userguide/models-supported.html
//!
//! The remote call sits behind [`ModelCatalog`] so the printing logic can be
//! exercised without an AWS account.

pub mod bedrock;

use std::{fmt::Display, io::Write};

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Separator printed after every model block.
pub const SEPARATOR: &str = "--------------------------------------------------";

/// One catalog entry, as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub model_id: String,
    pub provider_name: String,
    pub model_name: String,
}

impl ModelSummary {
    pub fn new(
        model_id: impl ToString,
        provider_name: impl ToString,
        model_name: impl ToString,
    ) -> Self {
        Self {
            model_id: model_id.to_string(),
            provider_name: provider_name.to_string(),
            model_name: model_name.to_string(),
        }
    }
}

impl Display for ModelSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Model ID: {}", self.model_id)?;
        writeln!(f, "Provider: {}", self.provider_name)?;
        writeln!(f, "Model Name: {}", self.model_name)?;
        write!(f, "{}", SEPARATOR)
    }
}

/// Optional narrowing of the listing.  Empty means everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelQuery {
    /// Case-insensitive provider, e.g. Amazon, anthropic.
    pub provider: Option<String>,
}

/// Anything that can answer ListFoundationModels.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Issues exactly one list request; results keep the service's order.
    async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSummary>>;
}

/// Lists the models and writes one block per model to `out`.
///
/// Returns how many models were printed.  An empty catalog prints nothing.
pub async fn print_models<C, W>(catalog: &C, query: &ModelQuery, out: &mut W) -> Result<usize>
where
    C: ModelCatalog + ?Sized,
    W: Write,
{
    let models = catalog.list_models(query).await?;
    write_models(models.iter(), out)?;
    Ok(models.len())
}

/// Writes model blocks in iteration order.
pub fn write_models<'a, W: Write>(
    models: impl IntoIterator<Item = &'a ModelSummary>,
    out: &mut W,
) -> Result<()> {
    for model in models {
        writeln!(out, "{}", model).map_err(Error::Output)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use super::*;
    use crate::error::FailureKind;

    /// Catalog that replays a canned answer and counts calls.
    pub(crate) struct FakeCatalog {
        pub(crate) models: Vec<ModelSummary>,
        pub(crate) fail_with: Option<FailureKind>,
        pub(crate) calls: AtomicUsize,
        pub(crate) queries: Mutex<Vec<ModelQuery>>,
    }

    impl FakeCatalog {
        pub(crate) fn with(models: Vec<ModelSummary>) -> Self {
            Self {
                models,
                fail_with: None,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(kind: FailureKind) -> Self {
            Self {
                fail_with: Some(kind),
                ..Self::with(Vec::new())
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelCatalog for FakeCatalog {
        async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSummary>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.clone());
            match self.fail_with {
                Some(kind) => Err(Error::Service {
                    operation: "ListFoundationModels",
                    kind,
                    message: "User is not authorized to perform: bedrock:ListFoundationModels"
                        .to_string(),
                }),
                None => Ok(self.models.clone()),
            }
        }
    }

    pub(crate) fn two_models() -> Vec<ModelSummary> {
        vec![
            ModelSummary::new("amazon.titan-text-express-v1", "Amazon", "Titan Text G1 - Express"),
            ModelSummary::new("anthropic.claude-v2", "Anthropic", "Claude"),
        ]
    }

    #[test]
    fn separator_is_fifty_dashes() {
        assert_eq!(SEPARATOR.len(), 50);
        assert!(SEPARATOR.chars().all(|c| c == '-'));
    }

    #[tokio::test]
    async fn prints_blocks_in_service_order() {
        let catalog = FakeCatalog::with(two_models());
        let mut out = Vec::new();

        let count = print_models(&catalog, &ModelQuery::default(), &mut out)
            .await
            .unwrap();

        let expected = "\
Model ID: amazon.titan-text-express-v1
Provider: Amazon
Model Name: Titan Text G1 - Express
--------------------------------------------------
Model ID: anthropic.claude-v2
Provider: Anthropic
Model Name: Claude
--------------------------------------------------
";
        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn one_block_per_model() {
        let models = (0..7)
            .map(|i| ModelSummary::new(format!("p.m-{i}"), "P", format!("M {i}")))
            .collect::<Vec<_>>();
        let catalog = FakeCatalog::with(models.clone());
        let mut out = Vec::new();

        print_models(&catalog, &ModelQuery::default(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 7 * 4);
        assert_eq!(text.lines().filter(|l| *l == SEPARATOR).count(), 7);
        let ids = text
            .lines()
            .filter_map(|l| l.strip_prefix("Model ID: "))
            .collect::<Vec<_>>();
        let expected = models.iter().map(|m| m.model_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn empty_catalog_prints_nothing() {
        let catalog = FakeCatalog::with(Vec::new());
        let mut out = Vec::new();

        let count = print_models(&catalog, &ModelQuery::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn denied_listing_is_not_retried() {
        let catalog = FakeCatalog::failing(FailureKind::AccessDenied);
        let mut out = Vec::new();

        let err = print_models(&catalog, &ModelQuery::default(), &mut out)
            .await
            .unwrap_err();

        assert!(err.is_access_denied(), "{err:?}");
        assert_eq!(catalog.calls(), 1);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn query_is_passed_through() {
        let catalog = FakeCatalog::with(Vec::new());
        let query = ModelQuery {
            provider: Some("anthropic".to_string()),
        };

        print_models(&catalog, &query, &mut Vec::new()).await.unwrap();

        assert_eq!(catalog.queries.lock().unwrap().as_slice(), &[query]);
    }

    /// Writer whose reader has gone away.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn closed_stdout_is_an_output_error() {
        let catalog = FakeCatalog::with(two_models());

        let err = print_models(&catalog, &ModelQuery::default(), &mut ClosedPipe)
            .await
            .unwrap_err();

        assert!(err.is_broken_pipe(), "{err:?}");
        assert!(!err.hint().contains("--write-policy"));
        assert_eq!(catalog.calls(), 1);
    }
}
