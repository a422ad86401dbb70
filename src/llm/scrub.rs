use crate::scan::secrets::{SECRET_PREFIXES, token_at};
use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Markers whose following token is a credential value.
const MARKER_PATTERNS: &[&str] = &[
    "Authorization: Bearer ",
    "authorization: bearer ",
    "\"authorization\":\"Bearer ",
    "api_key=",
    "access_token=",
    "\"api_key\":\"",
    "\"access_token\":\"",
    "\"token\":\"",
    "\"secret\":\"",
    "\"password\":\"",
    "password=",
    "secret=",
];

fn needs_scrubbing(input: &str) -> bool {
    SECRET_PREFIXES
        .iter()
        .map(|(prefix, _)| *prefix)
        .chain(MARKER_PATTERNS.iter().copied())
        .any(|pattern| input.contains(pattern))
}

/// Replace the token starting at `marker` (prefix) or right after it
/// (marker) with `[REDACTED]`. Bare markers without a value are kept.
fn scrub_token(scrubbed: &mut String, marker: &str, keep_marker: bool) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let value_start = start + marker.len();
        let end = value_start + token_at(scrubbed, value_start).len();
        if end == value_start {
            search_from = value_start;
            continue;
        }
        let replace_from = if keep_marker { value_start } else { start };
        scrubbed.replace_range(replace_from..end, REDACTED);
        search_from = replace_from + REDACTED.len();
    }
}

/// Scrub credential-like tokens from error text before it is logged.
///
/// Handles prefixed keys (`sk-`, `ghp_`, `AKIA`, ...) and header/query/json
/// markers such as `Authorization: Bearer ...` or `"api_key":"..."`.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    if !needs_scrubbing(input) {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in MARKER_PATTERNS {
        scrub_token(&mut scrubbed, marker, true);
    }
    for (prefix, _) in SECRET_PREFIXES {
        scrub_token(&mut scrubbed, prefix, false);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets and truncate to a loggable length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let end = scrubbed
        .char_indices()
        .nth(MAX_API_ERROR_CHARS)
        .map_or(scrubbed.len(), |(idx, _)| idx);
    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized error from a failed HTTP response.
pub async fn api_error(service: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let sanitized = sanitize_api_error(&body);
    anyhow::anyhow!("{service} API error ({status}): {sanitized}")
}
