/// Sanitizes user-supplied rich text before it is stored.
///
/// Whitelist-based: safe formatting tags survive, `<script>` (with its body),
/// `<iframe>` and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input.trim())
}

/// Optional profile text: blank input clears the field.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(clean_html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_keeps_formatting() {
        let cleaned = clean_html("<b>hi</b><script>alert(1)</script><p onclick=\"x()\">p</p>");
        assert_eq!(cleaned, "<b>hi</b><p>p</p>");
    }

    #[test]
    fn blank_optional_is_none() {
        assert_eq!(clean_optional(Some("   ")), None);
        assert_eq!(clean_optional(None), None);
        assert_eq!(clean_optional(Some(" bio ")), Some("bio".to_string()));
    }
}
