//! Rolling context window rendering.
//!
//! Pure functions that turn a conversation's messages into the transcript
//! stored on `Conversation::context`:
//!
//! 1. take the `window_size` most recent messages, oldest first
//! 2. render each as `"<Role>: <content>\n"`
//! 3. evict whole lines from the front until the text fits the character budget
//!
//! Favorite status plays no part in which messages enter the window.

use codefuse_types::config::ContextConfig;
use codefuse_types::message::Message;

/// Rendered context plus what was dropped to make it fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmedContext {
    pub text: String,
    /// Messages that entered the window before trimming.
    pub messages_in_window: usize,
    /// Lines evicted from the front to satisfy the budget.
    pub evicted_lines: usize,
}

/// Select the most recent `window_size` messages, in chronological order.
///
/// Recency is `(timestamp, id)`: messages sharing a timestamp keep
/// insertion order.
pub fn select_window(messages: &[Message], window_size: usize) -> Vec<&Message> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
    let skip = ordered.len().saturating_sub(window_size);
    ordered.split_off(skip)
}

/// Render one transcript line, terminator included.
pub fn render_line(message: &Message) -> String {
    format!("{}: {}\n", message.speaker().label(), message.content)
}

/// Concatenate rendered lines in the given order.
pub fn render_context(messages: &[&Message]) -> String {
    messages.iter().map(|m| render_line(m)).collect()
}

/// Drop lines from the front until `text` is at most `max_chars` characters.
///
/// A line is everything up to and including the next `'\n'`, so a message
/// whose content spans several lines is evicted one line at a time. Lines
/// are never cut partway; a single line longer than the budget is removed
/// entirely, which can leave the result empty.
pub fn trim_to_budget(text: String, max_chars: usize) -> (String, usize) {
    let mut remaining = text.chars().count();
    if remaining <= max_chars {
        return (text, 0);
    }

    let mut cut = 0;
    let mut evicted = 0;
    while remaining > max_chars {
        match text[cut..].find('\n') {
            Some(pos) => {
                let end = cut + pos + 1;
                remaining -= text[cut..end].chars().count();
                cut = end;
            }
            // Unterminated tail: it is the last line, so it goes too.
            None => {
                remaining = 0;
                cut = text.len();
            }
        }
        evicted += 1;
    }

    let mut text = text;
    (text.split_off(cut), evicted)
}

/// Render and trim the context window for a set of messages.
pub fn build_context(messages: &[Message], config: &ContextConfig) -> TrimmedContext {
    let window = select_window(messages, config.window_size);
    let rendered = render_context(&window);
    let (text, evicted_lines) = trim_to_budget(rendered, config.max_context_chars);

    TrimmedContext {
        text,
        messages_in_window: window.len(),
        evicted_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use codefuse_types::conversation::ConversationId;
    use codefuse_types::message::MessageId;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn msg(id: i64, is_user: bool, content: &str, offset_secs: i64) -> Message {
        Message {
            id: MessageId(id),
            conversation_id: ConversationId(1),
            content: content.to_string(),
            is_user_message: is_user,
            is_fav: false,
            timestamp: base_time() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_two_message_example() {
        let messages = vec![msg(1, true, "Hi", 0), msg(2, false, "Hello", 1)];
        let ctx = build_context(&messages, &ContextConfig::default());
        assert_eq!(ctx.text, "User: Hi\nAssistant: Hello\n");
        assert_eq!(ctx.messages_in_window, 2);
        assert_eq!(ctx.evicted_lines, 0);
    }

    #[test]
    fn test_empty_conversation_renders_empty() {
        let ctx = build_context(&[], &ContextConfig::default());
        assert_eq!(ctx.text, "");
        assert_eq!(ctx.messages_in_window, 0);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let messages = vec![msg(2, false, "Hello", 1), msg(1, true, "Hi", 0)];
        let ctx = build_context(&messages, &ContextConfig::default());
        assert_eq!(ctx.text, "User: Hi\nAssistant: Hello\n");
    }

    #[test]
    fn test_window_keeps_twenty_most_recent_oldest_first() {
        // "User: " (6) + 43 chars + "\n" = 50 chars per line
        let messages: Vec<Message> = (0..25)
            .map(|i| msg(i + 1, true, &format!("{:0>43}", i), i))
            .collect();
        let ctx = build_context(&messages, &ContextConfig::default());

        let lines: Vec<&str> = ctx.text.lines().collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], format!("User: {:0>43}", 5));
        assert_eq!(lines[19], format!("User: {:0>43}", 24));
        assert!(lines.iter().all(|l| l.len() == 49));
        assert_eq!(ctx.text.len(), 20 * 50);
    }

    #[test]
    fn test_favorites_do_not_affect_selection() {
        let mut messages: Vec<Message> = (0..22).map(|i| msg(i + 1, false, "x", i)).collect();
        // The oldest message is a favorite; it must still fall out of the window.
        messages[0].is_fav = true;
        messages[0].content = "pinned".to_string();

        let window = select_window(&messages, 20);
        assert_eq!(window.len(), 20);
        assert!(window.iter().all(|m| m.content != "pinned"));
        assert_eq!(window[0].id, MessageId(3));
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let messages = vec![
            msg(2, false, "second", 0),
            msg(1, true, "first", 0),
            msg(3, true, "third", 0),
        ];
        let window = select_window(&messages, 2);
        let ids: Vec<i64> = window.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_trim_evicts_oldest_lines_first() {
        let text = "User: aaaa\nAssistant: bb\nUser: c\n".to_string();
        // Lengths: 11 + 14 + 8 = 33
        let (trimmed, evicted) = trim_to_budget(text, 22);
        assert_eq!(trimmed, "Assistant: bb\nUser: c\n");
        assert_eq!(evicted, 1);
    }

    #[test]
    fn test_trim_never_cuts_partial_line() {
        let text = "User: 0123456789\nUser: z\n".to_string();
        let (trimmed, evicted) = trim_to_budget(text, 10);
        assert_eq!(trimmed, "User: z\n");
        assert_eq!(evicted, 1);
    }

    #[test]
    fn test_single_oversized_line_leaves_empty() {
        let text = format!("Assistant: {}\n", "y".repeat(100));
        let (trimmed, evicted) = trim_to_budget(text, 50);
        assert_eq!(trimmed, "");
        assert_eq!(evicted, 1);
    }

    #[test]
    fn test_multiline_content_is_evicted_line_by_line() {
        let text = "User: line one\nline two\nAssistant: ok\n".to_string();
        let (trimmed, evicted) = trim_to_budget(text, 24);
        assert_eq!(trimmed, "line two\nAssistant: ok\n");
        assert_eq!(evicted, 1);
    }

    #[test]
    fn test_budget_counts_characters_not_bytes() {
        // 6 + 4 + 1 = 11 characters, 15 bytes
        let text = "User: éééé\n".to_string();
        let (trimmed, evicted) = trim_to_budget(text.clone(), 11);
        assert_eq!(trimmed, text);
        assert_eq!(evicted, 0);
    }

    #[test]
    fn test_length_invariant_holds_over_budget() {
        let messages: Vec<Message> = (0..20)
            .map(|i| msg(i + 1, i % 2 == 0, &"w".repeat(3_000), i))
            .collect();
        let ctx = build_context(&messages, &ContextConfig::default());
        assert!(ctx.text.chars().count() <= 30_000);
        assert!(ctx.evicted_lines > 0);
        // The newest message always survives when it fits on its own.
        assert!(ctx.text.ends_with(&format!("Assistant: {}\n", "w".repeat(3_000))));
    }

    #[test]
    fn test_custom_limits() {
        let messages = vec![
            msg(1, true, "one", 0),
            msg(2, false, "two", 1),
            msg(3, true, "three", 2),
        ];
        let config = ContextConfig {
            window_size: 2,
            max_context_chars: 12,
        };
        let ctx = build_context(&messages, &config);
        assert_eq!(ctx.messages_in_window, 2);
        assert_eq!(ctx.text, "User: three\n");
        assert_eq!(ctx.evicted_lines, 1);
    }
}
