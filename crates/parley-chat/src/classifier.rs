//! Keyword-based two-level topic classification.
//!
//! Rules are evaluated in order and the first rule with a keyword contained
//! in the query wins. A catch-all tag makes classification total.

use std::collections::BTreeMap;

use parley_core::config::{default_taxonomy, AnalysisConfig, TopicRuleConfig};
use tracing::debug;

use crate::error::ChatError;
use crate::types::TopicTag;

// =============================================================================
// TopicTaxonomy
// =============================================================================

/// Fixed two-level label hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTaxonomy {
    levels: BTreeMap<String, Vec<String>>,
}

impl Default for TopicTaxonomy {
    fn default() -> Self {
        Self::new(default_taxonomy())
    }
}

impl TopicTaxonomy {
    pub fn new(levels: BTreeMap<String, Vec<String>>) -> Self {
        Self { levels }
    }

    /// Whether `tag.level_2` is a child of `tag.level_1`.
    pub fn contains(&self, tag: &TopicTag) -> bool {
        self.levels
            .get(&tag.level_1)
            .is_some_and(|children| children.iter().any(|c| c == &tag.level_2))
    }

    /// Level-1 labels in sorted order.
    pub fn level_1_labels(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    /// Children of a level-1 label, if it exists.
    pub fn children(&self, level_1: &str) -> Option<&[String]> {
        self.levels.get(level_1).map(Vec::as_slice)
    }

    fn check(&self, tag: &TopicTag) -> Result<(), ChatError> {
        if self.contains(tag) {
            Ok(())
        } else {
            Err(ChatError::InvalidTopic {
                level_1: tag.level_1.clone(),
                level_2: tag.level_2.clone(),
            })
        }
    }
}

// =============================================================================
// TopicRule
// =============================================================================

/// Keyword set mapped to a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRule {
    /// Lowercased keywords; any substring hit selects the rule.
    keywords: Vec<String>,
    topic: TopicTag,
}

impl TopicRule {
    /// Build a rule. Keywords are lowercased; blank keywords are rejected
    /// because they would match every query.
    pub fn new<I, S>(keywords: I, topic: TopicTag) -> Result<Self, ChatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .collect();

        if keywords.is_empty() {
            return Err(ChatError::InvalidRule(format!(
                "rule for {} has no keywords",
                topic
            )));
        }
        if keywords.iter().any(String::is_empty) {
            return Err(ChatError::InvalidRule(format!(
                "rule for {} has a blank keyword",
                topic
            )));
        }

        Ok(Self { keywords, topic })
    }

    pub fn topic(&self) -> &TopicTag {
        &self.topic
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    fn matches(&self, lowered_query: &str) -> bool {
        self.keywords.iter().any(|k| lowered_query.contains(k.as_str()))
    }
}

impl TryFrom<&TopicRuleConfig> for TopicRule {
    type Error = ChatError;

    fn try_from(cfg: &TopicRuleConfig) -> Result<Self, Self::Error> {
        TopicRule::new(&cfg.keywords, TopicTag::new(&cfg.level_1, &cfg.level_2))
    }
}

// =============================================================================
// TopicClassifier
// =============================================================================

/// Ordered first-match keyword classifier.
#[derive(Debug, Clone)]
pub struct TopicClassifier {
    rules: Vec<TopicRule>,
    fallback: TopicTag,
}

impl Default for TopicClassifier {
    /// The baseline rule table with a General/Chitchat fallback.
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default()).expect("Invalid default topic rules")
    }
}

impl TopicClassifier {
    /// Build a classifier, checking every rule's topic and the fallback
    /// against `taxonomy`.
    pub fn new(
        rules: Vec<TopicRule>,
        fallback: TopicTag,
        taxonomy: &TopicTaxonomy,
    ) -> Result<Self, ChatError> {
        taxonomy.check(&fallback)?;
        for rule in &rules {
            taxonomy.check(&rule.topic)?;
        }
        Ok(Self { rules, fallback })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ChatError> {
        let taxonomy = TopicTaxonomy::new(config.taxonomy.clone());
        let rules = config
            .topic_rules
            .iter()
            .map(TopicRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let fallback = TopicTag::new(&config.fallback_level_1, &config.fallback_level_2);
        Self::new(rules, fallback, &taxonomy)
    }

    /// Assign a topic to `query`. Never fails.
    pub fn classify(&self, query: &str) -> TopicTag {
        match self.matching_rule(query) {
            Some(idx) => {
                let topic = self.rules[idx].topic.clone();
                debug!(rule = idx, topic = %topic, "Topic rule matched");
                topic
            }
            None => self.fallback.clone(),
        }
    }

    /// Index of the first rule matching `query`, if any.
    pub fn matching_rule(&self, query: &str) -> Option<usize> {
        let lowered = query.to_lowercase();
        self.rules.iter().position(|r| r.matches(&lowered))
    }

    pub fn rules(&self) -> &[TopicRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &TopicTag {
        &self.fallback
    }
}

// =============================================================================
// Tests
// =============================================================================
