/// Parses a boolean written as `1`/`0`, `true`/`false`, `yes`/`no` or `on`/`off` (case-insensitive). Anything else is
/// `None`.
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    value.as_deref().and_then(parse_boolean).unwrap_or(default)
}
