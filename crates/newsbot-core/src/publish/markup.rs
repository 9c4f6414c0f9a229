/// Characters with meaning in Telegram MarkdownV2
const SPECIAL_CHARS: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Backslash-escape MarkdownV2 special characters in feed-derived text
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        if SPECIAL_CHARS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Bold title, summary block, then the link as plain text
///
/// `summary` is expected to carry its own leading separator. The link is
/// escaped too; Telegram still renders it as a clickable URL.
pub fn format_article_message(title: &str, summary: &str, link: &str) -> String {
    format!(
        "*{}*{}\n\n{}",
        escape_markdown(title),
        escape_markdown(summary),
        escape_markdown(link)
    )
}
