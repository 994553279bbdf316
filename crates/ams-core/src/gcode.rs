//! G-code argument helpers

/// Whether `value` can be embedded as a G-code parameter value.
///
/// Accepts ASCII alphanumerics plus `_ - . +`. Rejects anything that could
/// start a new parameter, comment or command.
pub fn is_safe_param(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
}

/// Format a color as the `RRGGBB` form used by firmware macros
pub fn hex_color(rgb: u32) -> String {
    format!("{:06X}", rgb & 0xFF_FFFF)
}

/// Parse `RRGGBB` / `#RRGGBB`; `None` for anything else
pub fn parse_hex_color(s: &str) -> Option<u32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
