use super::{InputScanner, OutputScanner, ScanFuture, ScanOutcome, ready};

pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Abusive terms matched as whole words (after lowercasing).
const LEXICON: &[&str] = &[
    "idiot",
    "moron",
    "stupid",
    "loser",
    "scum",
    "worthless",
    "pathetic",
    "bastard",
    "shut up",
    "kill yourself",
    "hate you",
    "go die",
];

/// Lexicon-based toxicity check usable on both sides of the responder.
///
/// Risk is `1 - 0.5^n` for `n` distinct lexicon hits; the text is invalid
/// once risk reaches the threshold (a single hit at the default).
#[derive(Debug, Clone)]
pub struct ToxicityScanner {
    threshold: f32,
}

impl Default for ToxicityScanner {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ToxicityScanner {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn evaluate(&self, text: &str) -> ScanOutcome {
        let hits = matched_terms(text);
        let risk = risk_for(hits.len());
        if !hits.is_empty() && risk >= self.threshold {
            tracing::debug!(hits = hits.len(), risk, "toxicity.detected");
            ScanOutcome::flag(text, risk)
        } else {
            ScanOutcome::pass(text, risk)
        }
    }
}

fn risk_for(hits: usize) -> f32 {
    let exponent = i32::try_from(hits).unwrap_or(i32::MAX);
    1.0 - 0.5_f32.powi(exponent)
}

/// Distinct lexicon entries appearing as whole words in `text`.
pub fn matched_terms(text: &str) -> Vec<&'static str> {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    let joined = format!(" {} ", words.join(" "));

    LEXICON
        .iter()
        .copied()
        .filter(|term| joined.contains(&format!(" {term} ")))
        .collect()
}

impl InputScanner for ToxicityScanner {
    fn name(&self) -> &str {
        "Toxicity"
    }

    fn scan<'a>(&'a self, prompt: &'a str) -> ScanFuture<'a> {
        ready(self.evaluate(prompt))
    }
}

impl OutputScanner for ToxicityScanner {
    fn name(&self) -> &str {
        "Toxicity"
    }

    fn scan<'a>(&'a self, _prompt: &'a str, output: &'a str) -> ScanFuture<'a> {
        ready(self.evaluate(output))
    }
}
