use super::{OutputScanner, ScanFuture, ScanOutcome, ready};
use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "for", "from", "how",
    "i", "in", "is", "it", "me", "my", "of", "on", "or", "please", "so", "that", "the", "this",
    "to", "was", "what", "with", "you", "your",
];

/// Output scanner comparing the content words of prompt and output.
///
/// Score is the share of prompt content words found in the output. Below
/// `floor` the output is invalid; a floor of `0.0` never blocks.
#[derive(Debug, Clone)]
pub struct RelevanceScanner {
    floor: f32,
}

impl RelevanceScanner {
    pub fn new(floor: f32) -> Self {
        Self { floor }
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }
}

fn content_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 1 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Share of `prompt` content words present in `output`, in `[0, 1]`.
/// A prompt without content words is fully relevant to anything.
#[allow(clippy::cast_precision_loss)]
pub fn overlap(prompt: &str, output: &str) -> f32 {
    let wanted = content_words(prompt);
    if wanted.is_empty() {
        return 1.0;
    }
    let present = content_words(output);
    let shared = wanted.intersection(&present).count();
    shared as f32 / wanted.len() as f32
}

impl OutputScanner for RelevanceScanner {
    fn name(&self) -> &str {
        "Relevance"
    }

    fn scan<'a>(&'a self, prompt: &'a str, output: &'a str) -> ScanFuture<'a> {
        let score = overlap(prompt, output);
        let risk = 1.0 - score;
        if score < self.floor {
            tracing::debug!(score, floor = self.floor, "relevance.below_floor");
            ready(ScanOutcome::flag(output, risk))
        } else {
            ready(ScanOutcome::pass(output, risk))
        }
    }
}
