//! Reply formatting for a fixed-width carriage.

use unicode_width::UnicodeWidthStr;

/// Default carriage width in columns.
pub const DEFAULT_WIDTH: usize = 70;
/// Default hanging indent after each carriage return.
pub const DEFAULT_INDENT: usize = 5;

/// Greedy word wrap.
///
/// Words are split on any whitespace and rejoined with single spaces. A word
/// wider than `width` sits alone on its line, unsplit.
pub fn wrap(message: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in message.split_whitespace() {
        let word_width = word.width();
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wraps `message` to `width` and joins the lines with a carriage return
/// followed by `indent` spaces.
///
/// Formatting its own output again with the same arguments is a no-op.
pub fn format(message: &str, width: usize, indent: usize) -> String {
    let separator = format!("\r{}", " ".repeat(indent));
    wrap(message, width).join(&separator)
}
