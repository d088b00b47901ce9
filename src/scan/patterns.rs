//! Fixed pattern tables for the local scanner.
//!
//! `DANGEROUS` covers dynamic code execution, unsafe DOM and storage mutation,
//! and uncontrolled network calls. `SUSPICIOUS` covers credential-like
//! identifiers, insecure transport, and cookie access.

use regex::Regex;
use std::sync::LazyLock;

use super::report::Severity;

/// One compiled detection rule.
pub struct PatternRule {
    pub id: &'static str,
    pub regex: Regex,
    pub severity: Severity,
    pub category: &'static str,
    pub description: &'static str,
    pub recommendation: &'static str,
}

type RuleSpec = (
    &'static str,
    &'static str,
    Severity,
    &'static str,
    &'static str,
    &'static str,
);

fn compile(specs: &[RuleSpec]) -> Vec<PatternRule> {
    specs
        .iter()
        .map(
            |&(id, pattern, severity, category, description, recommendation)| PatternRule {
                id,
                regex: Regex::new(pattern).expect("static pattern must compile"),
                severity,
                category,
                description,
                recommendation,
            },
        )
        .collect()
}

pub static DANGEROUS: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    compile(&[
        (
            "eval-call",
            r"\beval\s*\(",
            Severity::Critical,
            "code-execution",
            "eval() executes arbitrary strings as code",
            "Replace eval() with explicit logic or JSON.parse for data",
        ),
        (
            "function-constructor",
            r"\bnew\s+Function\s*\(",
            Severity::Critical,
            "code-execution",
            "new Function() compiles arbitrary strings as code",
            "Define the function directly instead of building it from a string",
        ),
        (
            "string-timer",
            r#"\bset(?:Timeout|Interval)\s*\(\s*["'`]"#,
            Severity::High,
            "code-execution",
            "Timer called with a string callback evaluates code",
            "Pass a function reference to setTimeout/setInterval",
        ),
        (
            "script-injection",
            r#"\bcreateElement\s*\(\s*["']script["']"#,
            Severity::High,
            "code-execution",
            "Injects a script element into the page",
            "Bundle the needed logic into the command instead of loading scripts",
        ),
        (
            "document-write",
            r"\bdocument\.write(?:ln)?\s*\(",
            Severity::High,
            "dom-manipulation",
            "document.write() can replace the page and inject markup",
            "Build nodes with createElement and textContent",
        ),
        (
            "html-assignment",
            r"\.(?:inner|outer)HTML\s*=",
            Severity::Medium,
            "dom-manipulation",
            "Assigning HTML strings can inject markup or scripts",
            "Use textContent or construct elements explicitly",
        ),
        (
            "insert-adjacent-html",
            r"\.insertAdjacentHTML\s*\(",
            Severity::Medium,
            "dom-manipulation",
            "insertAdjacentHTML() parses strings as markup",
            "Use insertAdjacentText or construct elements explicitly",
        ),
        (
            "storage-mutation",
            r"\b(?:localStorage|sessionStorage)\.(?:setItem|removeItem|clear)\s*\(",
            Severity::Medium,
            "storage",
            "Mutates persistent page storage",
            "Document what is stored and avoid clearing storage the page owns",
        ),
        (
            "external-fetch",
            r#"\bfetch\s*\(\s*["'`]https?://"#,
            Severity::Medium,
            "network",
            "Requests an external URL",
            "Document the endpoint and why the command needs it",
        ),
        (
            "xhr",
            r"\bnew\s+XMLHttpRequest\b",
            Severity::Medium,
            "network",
            "Opens an XMLHttpRequest",
            "Prefer fetch() against documented endpoints",
        ),
        (
            "send-beacon",
            r"\bnavigator\.sendBeacon\s*\(",
            Severity::High,
            "network",
            "Sends data to a remote endpoint in the background",
            "Remove background data transmission",
        ),
    ])
});

pub static SUSPICIOUS: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    compile(&[
        (
            "credential-identifier",
            r"(?i)\b(?:api[_-]?key|secret|password|passwd|access[_-]?token|auth[_-]?token|private[_-]?key)\b",
            Severity::Medium,
            "credentials",
            "References a credential-like identifier",
            "Never embed or collect credentials in a command",
        ),
        (
            "insecure-transport",
            r"\bhttp://",
            Severity::Medium,
            "insecure-transport",
            "Uses plain HTTP",
            "Use https:// URLs",
        ),
        (
            "cookie-access",
            r"\bdocument\.cookie\b",
            Severity::High,
            "cookie-access",
            "Reads or writes page cookies",
            "Avoid touching cookies; they can hold session credentials",
        ),
        (
            "base64-decode",
            r"\batob\s*\(",
            Severity::Low,
            "obfuscation",
            "Decodes base64 at runtime",
            "Ship readable code instead of encoded payloads",
        ),
    ])
});

/// Patterns that earn a small score bonus when present.
pub struct DefensivePatterns {
    pub try_catch: Regex,
    pub user_feedback: Regex,
    pub strict_mode: Regex,
}

pub static DEFENSIVE: LazyLock<DefensivePatterns> = LazyLock::new(|| DefensivePatterns {
    try_catch: Regex::new(r"\btry\s*\{[\s\S]*\bcatch\b").expect("static pattern must compile"),
    user_feedback: Regex::new(r"\b(?:alert|confirm|console\.(?:log|info|warn|error))\s*\(")
        .expect("static pattern must compile"),
    strict_mode: Regex::new(r#"["']use strict["']"#).expect("static pattern must compile"),
});

/// String literals longer than `threshold` characters.
pub fn long_literal(threshold: usize) -> Regex {
    let n = threshold + 1;
    Regex::new(&format!(
        r#""(?:[^"\\\n]|\\.){{{n},}}"|'(?:[^'\\\n]|\\.){{{n},}}'|`(?:[^`\\]|\\.){{{n},}}`"#
    ))
    .expect("long literal pattern must compile")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(rules: &[PatternRule], code: &str) -> Vec<&'static str> {
        rules
            .iter()
            .filter(|r| r.regex.is_match(code))
            .map(|r| r.id)
            .collect()
    }

    #[test]
    fn tables_compile() {
        assert!(!DANGEROUS.is_empty());
        assert!(!SUSPICIOUS.is_empty());
    }

    #[test]
    fn dangerous_matches() {
        assert_eq!(ids(&DANGEROUS, "eval('1')"), vec!["eval-call"]);
        assert_eq!(ids(&DANGEROUS, "x.innerHTML = y"), vec!["html-assignment"]);
        assert_eq!(
            ids(&DANGEROUS, "fetch('https://evil.example/x')"),
            vec!["external-fetch"]
        );
        assert!(ids(&DANGEROUS, "retrieval(1); medieval(2)").is_empty());
    }

    #[test]
    fn suspicious_matches() {
        assert_eq!(ids(&SUSPICIOUS, "let API_KEY = 1"), vec!["credential-identifier"]);
        assert_eq!(ids(&SUSPICIOUS, "document.cookie"), vec!["cookie-access"]);
        assert_eq!(ids(&SUSPICIOUS, "'http://x'"), vec!["insecure-transport"]);
    }

    #[test]
    fn long_literal_threshold() {
        let re = long_literal(10);
        assert!(!re.is_match("'0123456789'"));
        assert!(re.is_match("'01234567890'"));
        assert!(re.is_match("\"aaaaaaaaaaaaaaaa\""));
    }

    #[test]
    fn defensive_patterns() {
        assert!(DEFENSIVE.try_catch.is_match("try { a() } catch (e) {}"));
        assert!(DEFENSIVE.user_feedback.is_match("alert('done')"));
        assert!(DEFENSIVE.strict_mode.is_match("'use strict';"));
    }
}
