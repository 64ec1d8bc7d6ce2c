//! Scrubs tokens, session cookies and user ids before logging.

use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Bearer\s+[A-Za-z0-9\-\._~+/]+=*)|(sk-[A-Za-z0-9]{20,})").unwrap()
});
static COOKIE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(session(?:id)?|token)=[^;\s&]+").unwrap());
static USER_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bweb-[a-z0-9]{6}\b").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap());

pub fn redact_sensitive_data(input: &str) -> String {
    let out = TOKEN_RE.replace_all(input, "[REDACTED_TOKEN]");
    let out = COOKIE_RE.replace_all(&out, "$1=[REDACTED]");
    let out = EMAIL_RE.replace_all(&out, "[REDACTED_EMAIL]");
    USER_ID_RE.replace_all(&out, "web-******").into_owned()
}

/// Keep the first characters of an id so log lines stay correlatable.
pub fn redact_user_id(id: &str) -> String {
    let visible: String = id.chars().take(4).collect();
    if id.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
