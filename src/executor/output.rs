//! Trimming command output for error messages.

/// Keep the last `max_lines` lines of command output.
///
/// Build tools and package managers print the actionable part of a
/// failure last, so the tail is kept. Long lines are cut at 200 bytes and
/// the whole result is capped at 2000 bytes.
pub fn tail_output(output: &str, max_lines: usize) -> String {
    const MAX_LINE_LENGTH: usize = 200;
    const MAX_TOTAL_LENGTH: usize = 2000;

    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let skipped = lines.len().saturating_sub(max_lines);

    let mut result = String::new();
    if skipped > 0 {
        result.push_str(&format!("...[{} earlier lines omitted]", skipped));
    }

    for line in &lines[skipped..] {
        let truncated = if line.len() > MAX_LINE_LENGTH {
            let mut end = MAX_LINE_LENGTH;
            while !line.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &line[..end])
        } else {
            line.to_string()
        };

        if result.len() + truncated.len() > MAX_TOTAL_LENGTH {
            result.push_str("\n...[truncated]");
            break;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&truncated);
    }

    result
}
