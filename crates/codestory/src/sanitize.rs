//! Redaction of credentials and personal data.
//!
//! Two concerns live here: [`SanitizationEngine`] scrubs file text before it
//! leaves the process (generator prompts, stored fragments), and
//! [`redact_path`] keeps directory layout out of tracing span fields.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

pub const REDACTED: &str = "***REDACTED***";

/// Extensions whose files are always scrubbed because they tend to hold
/// deployment settings.
pub const SANITIZE_CONFIG_EXTENSIONS: &[&str] =
    &["env", "yml", "yaml", "ini", "cfg", "conf", "toml"];

pub const SANITIZE_CODE_EXTENSIONS: &[&str] =
    &["py", "js", "ts", "jsx", "tsx", "java", "go", "rb", "php"];

/// One ordered redaction step. `replacement` uses `regex` expansion syntax.
pub struct SanitizationRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub replacement: &'static str,
}

impl SanitizationRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            replacement,
        }
    }
}

// Order matters: the network and email rules run last so they only see text
// the assignment rules left alone.
static DEFAULT_RULES: LazyLock<Vec<SanitizationRule>> = LazyLock::new(|| {
    vec![
        SanitizationRule::new(
            "credential_key_double_quoted",
            r#"(?i)(api[_-]?key|secret[_-]?key|access[_-]?token|auth[_-]?token|private[_-]?key)(\s*[:=]\s*)"[^"]*""#,
            r#"${1}${2}"***REDACTED***""#,
        ),
        SanitizationRule::new(
            "credential_key_single_quoted",
            r"(?i)(api[_-]?key|secret[_-]?key|access[_-]?token|auth[_-]?token|private[_-]?key)(\s*[:=]\s*)'[^']*'",
            r"${1}${2}'***REDACTED***'",
        ),
        SanitizationRule::new(
            "password_double_quoted",
            r#"(?i)(password|passwd|pwd|secret|token|credential)(\s*[:=]\s*)"[^"]*""#,
            r#"${1}${2}"***REDACTED***""#,
        ),
        SanitizationRule::new(
            "password_single_quoted",
            r"(?i)(password|passwd|pwd|secret|token|credential)(\s*[:=]\s*)'[^']*'",
            r"${1}${2}'***REDACTED***'",
        ),
        SanitizationRule::new(
            "env_assignment",
            r"(?im)^((?:API_KEY|SECRET_KEY|PASSWORD|DB_PASSWORD|AUTH_TOKEN|ACCESS_TOKEN|PRIVATE_KEY)\s*=\s*)(.+)$",
            r"${1}***REDACTED***",
        ),
        SanitizationRule::new(
            "ipv4_address",
            r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
            "***.***.***.***",
        ),
        SanitizationRule::new(
            "email_address",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            "***@***.***",
        ),
    ]
});

/// Applies the fixed rule list, in order, to files selected by name.
pub struct SanitizationEngine {
    rules: &'static [SanitizationRule],
}

impl SanitizationEngine {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.as_slice(),
        }
    }

    pub fn rules(&self) -> &[SanitizationRule] {
        self.rules
    }

    /// Scrubs `content` when `path` is a config-like or source file and
    /// returns it unchanged otherwise.
    pub fn sanitize<'a>(&self, path: &Path, content: &'a str) -> Cow<'a, str> {
        if should_sanitize(path) {
            Cow::Owned(self.sanitize_text(content))
        } else {
            Cow::Borrowed(content)
        }
    }

    /// Runs every rule regardless of file type.
    pub fn sanitize_text(&self, content: &str) -> String {
        let mut text = content.to_string();
        for rule in self.rules {
            if let Cow::Owned(replaced) = rule.pattern.replace_all(&text, rule.replacement) {
                text = replaced;
            }
        }
        text
    }
}

impl Default for SanitizationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Decided by file name alone. Env files (`.env`, `.env.local`, `prod.env`)
/// count as config.
pub fn should_sanitize(path: &Path) -> bool {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase())
        .unwrap_or_default();

    if file_name == ".env" || file_name.starts_with(".env.") {
        return true;
    }

    let ext = crate::classify::extension_of(path);
    SANITIZE_CONFIG_EXTENSIONS.contains(&ext.as_str())
        || SANITIZE_CODE_EXTENSIONS.contains(&ext.as_str())
}

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing where the
/// archive was unpacked.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
