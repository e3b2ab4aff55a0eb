//! Query analysis: reference resolution plus topic tagging.

use parley_core::config::AnalysisConfig;

use crate::classifier::TopicClassifier;
use crate::error::ChatError;
use crate::resolver::ReferenceResolver;
use crate::types::{AnalysisResult, Turn};

/// Pure composition of [`ReferenceResolver`] and [`TopicClassifier`].
#[derive(Debug, Clone, Default)]
pub struct QueryAnalyzer {
    resolver: ReferenceResolver,
    classifier: TopicClassifier,
}

impl QueryAnalyzer {
    pub fn new(resolver: ReferenceResolver, classifier: TopicClassifier) -> Self {
        Self {
            resolver,
            classifier,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ChatError> {
        Ok(Self::new(
            ReferenceResolver::from_config(config),
            TopicClassifier::from_config(config)?,
        ))
    }

    /// Analyze `query` in the context of the turns before it.
    ///
    /// The topic is taken from the raw query, not the expansion.
    pub fn analyze(&self, query: &str, prior_turns: &[Turn]) -> AnalysisResult {
        AnalysisResult {
            expanded_query: self.resolver.expand(query, prior_turns),
            topic: self.classifier.classify(query),
        }
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    pub fn classifier(&self) -> &TopicClassifier {
        &self.classifier
    }
}
