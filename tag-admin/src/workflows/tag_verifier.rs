//! Guard for short-code verification on the sale form.
//!
//! The form debounces keystrokes with an htmx `delay:600ms` trigger; every
//! lookup that still reaches the server passes through [`should_verify`].

pub const MIN_SHORT_CODE_LEN: usize = 3;

/// A lookup fires only for a trimmed code of at least three characters that
/// differs from the last successfully verified one.
pub fn should_verify(code: &str, last_verified: Option<&str>) -> bool {
    let code = code.trim();
    code.chars().count() >= MIN_SHORT_CODE_LEN && last_verified.map(str::trim) != Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rules() {
        assert!(!should_verify("", None));
        assert!(!should_verify("AB", None));
        assert!(!should_verify("  AB  ", None));
        assert!(should_verify("ABC", None));
        assert!(!should_verify("ABC", Some("ABC")));
        assert!(!should_verify(" ABC ", Some("ABC")));
        assert!(should_verify("ABD", Some("ABC")));
    }
}
