use super::{InputScanner, ScanFuture, ScanOutcome, ready};

/// Phrase families seen in prompt-injection attempts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct InjectionSignals {
    pub instruction_override: bool,
    pub privilege_escalation: bool,
    pub secret_exfiltration: bool,
    pub tool_jailbreak: bool,
}

impl InjectionSignals {
    pub fn count(&self) -> usize {
        [
            self.instruction_override,
            self.privilege_escalation,
            self.secret_exfiltration,
            self.tool_jailbreak,
        ]
        .into_iter()
        .filter(|hit| *hit)
        .count()
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }

    /// 0.0 for no hit, 0.8 for one family, saturating at 1.0.
    #[allow(clippy::cast_precision_loss)]
    pub fn risk_score(&self) -> f32 {
        match self.count() {
            0 => 0.0,
            n => (0.7 + 0.1 * n as f32).min(1.0),
        }
    }
}

pub fn detect_injection_signals(text: &str) -> InjectionSignals {
    let normalized = normalize_whitespace(&text.to_lowercase());
    let contains_any = |patterns: &[&str]| patterns.iter().any(|p| normalized.contains(p));

    InjectionSignals {
        instruction_override: contains_any(&[
            "ignore previous instructions",
            "ignore all previous instructions",
            "ignore the above",
            "disregard previous instructions",
            "disregard your instructions",
            "forget previous instructions",
            "forget your instructions",
            "new instructions:",
            "reveal your system prompt",
            "print your system prompt",
        ]),
        privilege_escalation: contains_any(&[
            "bypass safety",
            "disable guard",
            "override safety",
            "act as system",
            "you are now root",
            "developer mode",
            "do anything now",
            "without any restrictions",
        ]),
        secret_exfiltration: contains_any(&[
            "reveal secrets",
            "exfiltrate",
            "print api key",
            "show environment variables",
            "dump tokens",
            "leak the password",
        ]),
        tool_jailbreak: contains_any(&[
            "tool jailbreak",
            "execute shell",
            "run this command",
            "call the shell tool",
            "bypass tool policy",
        ]),
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Input scanner over [`detect_injection_signals`]. Any matched family
/// invalidates the prompt; the text is never rewritten.
pub struct PromptInjectionScanner;

impl InputScanner for PromptInjectionScanner {
    fn name(&self) -> &str {
        "PromptInjection"
    }

    fn scan<'a>(&'a self, prompt: &'a str) -> ScanFuture<'a> {
        let signals = detect_injection_signals(prompt);
        let risk = signals.risk_score();
        if signals.any() {
            tracing::debug!(?signals, "prompt_injection.detected");
            ready(ScanOutcome::flag(prompt, risk))
        } else {
            ready(ScanOutcome::pass(prompt, risk))
        }
    }
}
