use crate::config::DEFAULT_TAG_TYPE;
use once_cell::sync::Lazy;
use regex::Regex;

static PROBLEM_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[=\+/&<>;'"\?%#$@,\. \t\r\n]"#).unwrap());

/// A tag key split into its namespace and the remaining key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedKey<'a> {
    pub namespace: &'a str,
    pub key: &'a str,
}

/// Returns `None` when the key contains a problem character and must be dropped.
///
/// Only the first colon separates the namespace: `a:b:c` becomes `a` / `b:c`.
pub fn classify_key(raw: &str) -> Option<ClassifiedKey<'_>> {
    if PROBLEM_CHARS.is_match(raw) {
        return None;
    }

    let classified = match raw.split_once(':') {
        Some((namespace, key)) => ClassifiedKey { namespace, key },
        None => ClassifiedKey {
            namespace: DEFAULT_TAG_TYPE,
            key: raw,
        },
    };
    Some(classified)
}
