use super::{InputScanner, OutputScanner, ScanFuture, ScanOutcome, ready};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

/// A credential found in scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSecret {
    /// Human-readable label for the kind of secret found.
    pub kind: &'static str,
    /// The matched fragment, truncated for display safety.
    pub matched: String,
    pub encoding: SecretEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretEncoding {
    Plain,
    UrlEncoded,
    Base64,
    Hex,
}

/// Known credential prefixes and their labels.
pub(crate) const SECRET_PREFIXES: &[(&str, &str)] = &[
    ("sk-", "OpenAI/Stripe API key"),
    ("ghp_", "GitHub personal access token"),
    ("github_pat_", "GitHub fine-grained PAT"),
    ("gho_", "GitHub OAuth token"),
    ("AKIA", "AWS access key"),
    ("ASIA", "AWS temporary access key"),
    ("xoxb-", "Slack bot token"),
    ("xoxp-", "Slack user token"),
    ("hf_", "Hugging Face token"),
    ("glpat-", "GitLab personal access token"),
    ("AIza", "Google API key"),
    ("ya29.", "Google OAuth access token"),
    ("eyJ", "JWT token"),
];

/// Minimum token length after the prefix for a match to count.
const MIN_TOKEN_TAIL: usize = 8;

pub(crate) fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

pub(crate) fn token_at(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    let end = rest.find(|c: char| !is_token_char(c)).unwrap_or(rest.len());
    &rest[..end]
}

/// Every prefixed token in `haystack` with a long enough tail.
fn prefixed_tokens(haystack: &str) -> Vec<(&'static str, &str)> {
    let mut found = Vec::new();
    for &(prefix, kind) in SECRET_PREFIXES {
        for (pos, _) in haystack.match_indices(prefix) {
            let token = token_at(haystack, pos);
            if token.len().saturating_sub(prefix.len()) >= MIN_TOKEN_TAIL {
                found.push((kind, token));
            }
        }
    }
    found
}

/// Scan `text` for credentials in plain, URL-encoded, base64 and hex form.
pub fn scan_for_secrets(text: &str) -> Vec<DetectedSecret> {
    let mut secrets: Vec<DetectedSecret> = prefixed_tokens(text)
        .into_iter()
        .map(|(kind, token)| detected(kind, token, SecretEncoding::Plain))
        .collect();

    let url_decoded = url_decode(text);
    if url_decoded != text {
        for (kind, token) in prefixed_tokens(&url_decoded) {
            if !text.contains(token) {
                secrets.push(detected(kind, token, SecretEncoding::UrlEncoded));
            }
        }
    }

    for candidate in runs(text, |c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='), 16) {
        if let Some(decoded) = BASE64_STANDARD
            .decode(candidate)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            for (kind, token) in prefixed_tokens(&decoded) {
                secrets.push(detected(kind, token, SecretEncoding::Base64));
            }
        }
    }

    for candidate in runs(text, |c| c.is_ascii_hexdigit(), 32) {
        if candidate.len() % 2 != 0 {
            continue;
        }
        if let Some(decoded) = hex::decode(candidate)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            for (kind, token) in prefixed_tokens(&decoded) {
                secrets.push(detected(kind, token, SecretEncoding::Hex));
            }
        }
    }

    secrets
}

/// Replace every plain-text credential token with `[REDACTED]`.
pub fn redact_secrets(text: &str) -> String {
    let mut redacted = text.to_string();
    for (_, token) in prefixed_tokens(text) {
        redacted = redacted.replace(token, "[REDACTED]");
    }
    redacted
}

fn detected(kind: &'static str, token: &str, encoding: SecretEncoding) -> DetectedSecret {
    let matched = if token.len() <= 16 {
        token.to_string()
    } else {
        format!("{}...", &token[..12])
    };
    DetectedSecret {
        kind,
        matched,
        encoding,
    }
}

/// Simple percent-decode (handles `%XX` sequences).
fn url_decode(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        let hex: String = chars.by_ref().take(2).collect();
        match u8::from_str_radix(&hex, 16) {
            Ok(byte) if hex.len() == 2 => result.push(char::from(byte)),
            _ => {
                result.push('%');
                result.push_str(&hex);
            }
        }
    }
    result
}

/// Contiguous runs of characters accepted by `accept` of at least `min_len` bytes.
fn runs(text: &str, accept: impl Fn(char) -> bool, min_len: usize) -> Vec<&str> {
    text.split(|c: char| !accept(c))
        .filter(|run| run.len() >= min_len)
        .collect()
}

fn secrets_outcome(text: &str) -> ScanOutcome {
    let secrets = scan_for_secrets(text);
    if secrets.is_empty() {
        ScanOutcome::pass(text, 0.0)
    } else {
        tracing::debug!(
            kinds = ?secrets.iter().map(|s| s.kind).collect::<Vec<_>>(),
            "secrets.detected"
        );
        ScanOutcome::flag(redact_secrets(text), 1.0)
    }
}

/// Input scanner: rejects prompts carrying credentials.
pub struct SecretsScanner;

impl InputScanner for SecretsScanner {
    fn name(&self) -> &str {
        "Secrets"
    }

    fn scan<'a>(&'a self, prompt: &'a str) -> ScanFuture<'a> {
        ready(secrets_outcome(prompt))
    }
}

/// Output scanner: rejects responses that would leak credentials.
pub struct SensitiveScanner;

impl OutputScanner for SensitiveScanner {
    fn name(&self) -> &str {
        "Sensitive"
    }

    fn scan<'a>(&'a self, _prompt: &'a str, output: &'a str) -> ScanFuture<'a> {
        ready(secrets_outcome(output))
    }
}
