//! Conversational reference resolution.
//!
//! Rewrites a query that leans on earlier turns ("what about that?",
//! "what did you think of him?") into a form that stands on its own.
//! Only the most recent assistant turn is ever consulted.

use std::sync::LazyLock;

use parley_core::config::AnalysisConfig;
use regex::{NoExpand, Regex};
use tracing::debug;

use crate::store::last_with_role;
use crate::types::{Role, Turn};

// =============================================================================
// Trigger patterns
// =============================================================================

static DEMONSTRATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:that|it)\b").expect("Invalid demonstrative regex"));

static PERSONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:him|her|them)\b").expect("Invalid personal regex"));

// =============================================================================
// Resolution
// =============================================================================

/// Which rewrite rule produced an expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionRule {
    /// "that"/"it" pointed at the previous assistant turn.
    Demonstrative,
    /// "him"/"her"/"them" replaced by the person placeholder.
    Personal,
    /// No trigger token; query returned as-is.
    Unchanged,
}

/// An expanded query together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub expanded: String,
    pub rule: ResolutionRule,
}

/// Rule-based resolver for one-hop conversational references.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    /// Number of leading tokens quoted from the previous assistant turn.
    pub anaphora_token_count: usize,
    /// Used when there is no assistant turn to quote.
    pub topic_placeholder: String,
    /// Replaces personal pronouns.
    pub person_placeholder: String,
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl ReferenceResolver {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            anaphora_token_count: config.anaphora_token_count,
            topic_placeholder: config.topic_placeholder.clone(),
            person_placeholder: config.person_placeholder.clone(),
        }
    }

    /// Expand `query` against the turns that precede it.
    pub fn expand(&self, query: &str, prior_turns: &[Turn]) -> String {
        self.resolve(query, prior_turns).expanded
    }

    /// Like [`expand`](Self::expand), but also reports which rule fired.
    ///
    /// Demonstratives win over personal pronouns when both are present.
    pub fn resolve(&self, query: &str, prior_turns: &[Turn]) -> Resolution {
        if DEMONSTRATIVE.is_match(query) {
            let subject = last_with_role(prior_turns, Role::Assistant)
                .map(|turn| self.leading_tokens(&turn.content))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| self.topic_placeholder.clone());
            debug!(subject = %subject, "Resolved demonstrative reference");
            return Resolution {
                expanded: format!("What about {}...?", subject),
                rule: ResolutionRule::Demonstrative,
            };
        }

        if PERSONAL.is_match(query) {
            let expanded = PERSONAL
                .replace_all(query, NoExpand(&self.person_placeholder))
                .into_owned();
            debug!(expanded = %expanded, "Resolved personal reference");
            return Resolution {
                expanded,
                rule: ResolutionRule::Personal,
            };
        }

        Resolution {
            expanded: query.to_string(),
            rule: ResolutionRule::Unchanged,
        }
    }

    fn leading_tokens(&self, content: &str) -> String {
        content
            .split_whitespace()
            .take(self.anaphora_token_count)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisResult, TopicTag};

    fn resolver() -> ReferenceResolver {
        ReferenceResolver::default()
    }

    fn user(text: &str) -> Turn {
        Turn::user(
            text,
            AnalysisResult {
                expanded_query: text.to_string(),
                topic: TopicTag::new("General", "Chitchat"),
            },
        )
    }

    fn france_history() -> Vec<Turn> {
        vec![Turn::assistant(
            "The capital of France is Paris, a city known for art and food.",
        )]
    }

    // ---- Demonstratives ----

    #[test]
    fn test_that_quotes_previous_assistant_turn() {
        let out = resolver().expand("what about that", &france_history());
        assert_eq!(out, "What about The capital of France is...?");
    }

    #[test]
    fn test_it_quotes_previous_assistant_turn() {
        let out = resolver().expand("Is it expensive?", &france_history());
        assert_eq!(out, "What about The capital of France is...?");
    }

    #[test]
    fn test_that_without_assistant_turn_uses_placeholder() {
        let out = resolver().expand("what about that", &[]);
        assert_eq!(out, "What about the topic...?");
    }

    #[test]
    fn test_that_with_only_user_turns_uses_placeholder() {
        let history = vec![user("hello"), user("anyone?")];
        let out = resolver().expand("and that?", &history);
        assert_eq!(out, "What about the topic...?");
    }

    #[test]
    fn test_uses_most_recent_assistant_turn_only() {
        let history = vec![
            Turn::assistant("Old answer about cricket scores today"),
            user("ok"),
            Turn::assistant("Newer answer about tennis"),
            user("hmm"),
        ];
        let out = resolver().expand("tell me more about that", &history);
        assert_eq!(out, "What about Newer answer about tennis...?");
    }

    #[test]
    fn test_short_assistant_turn_quoted_whole() {
        let history = vec![Turn::assistant("Yes.")];
        assert_eq!(resolver().expand("why that?", &history), "What about Yes....?");
    }

    #[test]
    fn test_demonstrative_case_insensitive() {
        let out = resolver().expand("WHAT ABOUT THAT", &france_history());
        assert_eq!(out, "What about The capital of France is...?");
    }

    #[test]
    fn test_demonstrative_inside_word_does_not_trigger() {
        let q = "Write the item list with thatch";
        assert_eq!(resolver().expand(q, &france_history()), q);
    }

    #[test]
    fn test_contraction_triggers_demonstrative() {
        let res = resolver().resolve("it's great", &france_history());
        assert_eq!(res.rule, ResolutionRule::Demonstrative);
    }

    #[test]
    fn test_custom_token_count() {
        let r = ReferenceResolver {
            anaphora_token_count: 2,
            ..ReferenceResolver::default()
        };
        assert_eq!(
            r.expand("that one", &france_history()),
            "What about The capital...?"
        );
    }

    #[test]
    fn test_zero_token_count_falls_back_to_placeholder() {
        let r = ReferenceResolver {
            anaphora_token_count: 0,
            ..ReferenceResolver::default()
        };
        assert_eq!(r.expand("that one", &france_history()), "What about the topic...?");
    }

    // ---- Personal references ----

    #[test]
    fn test_him_replaced() {
        let out = resolver().expand("What did you think of him?", &[]);
        assert_eq!(out, "What did you think of [referenced person]?");
    }

    #[test]
    fn test_all_personal_variants_replaced() {
        let out = resolver().expand("Tell HER and Them about him", &[]);
        assert_eq!(
            out,
            "Tell [referenced person] and [referenced person] about [referenced person]"
        );
    }

    #[test]
    fn test_personal_inside_word_untouched() {
        let q = "Where is the theme park near here?";
        assert_eq!(resolver().expand(q, &[]), q);
    }

    #[test]
    fn test_personal_placeholder_is_literal() {
        let r = ReferenceResolver {
            person_placeholder: "$1 person".to_string(),
            ..ReferenceResolver::default()
        };
        assert_eq!(r.expand("ask him", &[]), "ask $1 person");
    }

    // ---- Precedence and neutral input ----

    #[test]
    fn test_demonstrative_beats_personal() {
        let res = resolver().resolve("did he say that to him?", &france_history());
        assert_eq!(res.rule, ResolutionRule::Demonstrative);
        assert_eq!(res.expanded, "What about The capital of France is...?");
    }

    #[test]
    fn test_neutral_query_unchanged() {
        for q in ["", "   ", "Tell me about the latest Marvel movie", "What is 2+2?"] {
            let res = resolver().resolve(q, &france_history());
            assert_eq!(res.rule, ResolutionRule::Unchanged);
            assert_eq!(res.expanded, q);
        }
    }
}
