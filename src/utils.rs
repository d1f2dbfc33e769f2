use std::time::Duration;

/// Maximum length of a raw response snippet kept for diagnostics
pub const MAX_SNIPPET_CHARS: usize = 200;

/// Bounded, single-line excerpt of a response body.
///
/// Whitespace runs collapse to one space and the result is cut on a char
/// boundary, with an ellipsis when anything was dropped.
pub fn snippet(body: &str) -> String {
    snippet_with_limit(body, MAX_SNIPPET_CHARS)
}

pub fn snippet_with_limit(body: &str, max_chars: usize) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Human-friendly duration: `850ms`, `2.4s`
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
