/// First line of `text`, cut to at most `max_chars` characters with a
/// trailing ellipsis when anything was dropped.
pub fn first_line(text: &str, max_chars: usize) -> String {
    let mut lines = text.trim().lines();
    let line = lines.next().unwrap_or("").trim_end();
    let more_lines = lines.next().is_some();
    if line.chars().count() <= max_chars && !more_lines {
        return line.to_string();
    }
    let mut truncated: String = line.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
