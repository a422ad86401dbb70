use crate::config::StaticFilterConfig;

pub const ENCODED_BLOB_REASON: &str = "suspiciously long encoded string detected.";
pub const GEOPOLITICAL_REASON: &str = "sensitive geopolitical topic in controversial context.";
/// Shortest encoded run the blob rule may be configured to block.
pub const MIN_BLOB_RUN: usize = 40;

/// Outcome of the deterministic pattern checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVerdict {
    pub blocked: bool,
    pub reason: Option<String>,
}

impl StaticVerdict {
    pub fn pass() -> Self {
        Self {
            blocked: false,
            reason: None,
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            blocked: true,
            reason: Some(reason.into()),
        }
    }
}

/// A pair of named entities set against each other ("A vs B", either order)
/// that only blocks when one of `trigger_terms` appears anywhere in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRule {
    pub entities: (String, String),
    pub connectors: Vec<String>,
    pub trigger_terms: Vec<String>,
    pub reason: String,
}

impl TopicRule {
    pub fn new(
        first: &str,
        second: &str,
        trigger_terms: &[&str],
        reason: impl Into<String>,
    ) -> Self {
        Self {
            entities: (first.to_lowercase(), second.to_lowercase()),
            // Longest first so "versus" is not read as "v" + "ersus".
            connectors: vec!["versus".into(), "vs.".into(), "vs".into()],
            trigger_terms: trigger_terms.iter().map(|t| t.to_lowercase()).collect(),
            reason: reason.into(),
        }
    }

    /// India / Pakistan in a violent or hateful framing.
    pub fn india_pakistan() -> Self {
        Self::new(
            "india",
            "pakistan",
            &[
                "fight",
                "attack",
                "war",
                "violence",
                "riot",
                "terror",
                "hate",
                "bloodshed",
            ],
            GEOPOLITICAL_REASON,
        )
    }

    /// `lowered` must already be lowercase.
    fn matches(&self, lowered: &str) -> bool {
        let (first, second) = (&self.entities.0, &self.entities.1);
        let paired = self.pair_at_any(lowered, first, second) || self.pair_at_any(lowered, second, first);
        paired && self.trigger_terms.iter().any(|term| lowered.contains(term.as_str()))
    }

    fn pair_at_any(&self, lowered: &str, left: &str, right: &str) -> bool {
        lowered
            .match_indices(left)
            .any(|(pos, _)| self.pair_follows(&lowered[pos + left.len()..], right))
    }

    fn pair_follows(&self, rest: &str, right: &str) -> bool {
        let rest = rest.trim_start();
        self.connectors.iter().any(|connector| {
            rest.strip_prefix(connector.as_str())
                .is_some_and(|after| after.trim_start().starts_with(right))
        })
    }
}

/// Fast deterministic checks run between the scanner bank and the reviewer.
///
/// Rules run in order and the first match wins:
/// 1. a run of at least `min_blob_run` base64-alphabet characters;
/// 2. each [`TopicRule`], in list order.
#[derive(Debug, Clone)]
pub struct StaticFilter {
    min_blob_run: usize,
    topic_rules: Vec<TopicRule>,
}

impl Default for StaticFilter {
    fn default() -> Self {
        Self::new(MIN_BLOB_RUN, vec![TopicRule::india_pakistan()])
    }
}

impl StaticFilter {
    pub fn new(min_blob_run: usize, topic_rules: Vec<TopicRule>) -> Self {
        Self {
            min_blob_run,
            topic_rules,
        }
    }

    pub fn from_config(config: &StaticFilterConfig) -> Self {
        Self::new(
            config.min_blob_run.max(MIN_BLOB_RUN),
            vec![TopicRule::india_pakistan()],
        )
    }

    pub fn with_topic_rule(mut self, rule: TopicRule) -> Self {
        self.topic_rules.push(rule);
        self
    }

    pub fn topic_rules(&self) -> &[TopicRule] {
        &self.topic_rules
    }

    pub fn check(&self, text: &str) -> StaticVerdict {
        if longest_base64_run(text) >= self.min_blob_run {
            tracing::info!(rule = "encoded_blob", "static_filter.hit");
            return StaticVerdict::block(ENCODED_BLOB_REASON);
        }

        let lowered = text.to_lowercase();
        for rule in &self.topic_rules {
            if rule.matches(&lowered) {
                tracing::info!(
                    rule = "topic",
                    entities = %format!("{}/{}", rule.entities.0, rule.entities.1),
                    "static_filter.hit"
                );
                return StaticVerdict::block(rule.reason.clone());
            }
        }

        StaticVerdict::pass()
    }
}

fn is_base64_alphabet(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/')
}

/// Length of the longest contiguous run of `[A-Za-z0-9+/]`. Trailing `=`
/// padding is optional and never needed to reach the threshold.
fn longest_base64_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if is_base64_alphabet(c) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
