//! Greedy word wrapping for card text

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

/// Break `text` into lines of at most `max_chars` characters.
///
/// Words are separated by single spaces and packed greedily. A newline inside
/// a word forces a break at that point regardless of width. A single word
/// longer than `max_chars` gets a line of its own and is not split. Runs of
/// spaces collapse, and no line starts with a separator.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for token in text.split(' ') {
        let mut pieces = token.split('\n').map(|p| p.trim_end_matches('\r'));

        if let Some(first) = pieces.next() {
            push_word(&mut lines, &mut line, first, max_chars);
        }
        for piece in pieces {
            lines.push(core::mem::take(&mut line));
            push_word(&mut lines, &mut line, piece, max_chars);
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn push_word(lines: &mut Vec<String>, line: &mut String, word: &str, max_chars: usize) {
    if word.is_empty() {
        return;
    }

    let width = line.chars().count();
    if width > 0 && width + 1 + word.chars().count() > max_chars {
        lines.push(core::mem::take(line));
    }

    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str(word);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_greedy_packing() {
        assert_eq!(wrap_text("the quick brown fox", 10), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_embedded_newline_forces_break() {
        assert_eq!(wrap_text("ab\ncd", 10), vec!["ab", "cd"]);
        assert_eq!(
            wrap_text("You wake.\nThe room is dark", 40),
            vec!["You wake.", "The room is dark"]
        );
    }

    #[test]
    fn test_long_word_gets_own_line() {
        assert_eq!(
            wrap_text("a supercalifragilistic day", 8),
            vec!["a", "supercalifragilistic", "day"]
        );
    }

    #[test]
    fn test_no_leading_separator() {
        let lines = wrap_text("   spaced   out", 37);
        assert_eq!(lines, vec!["spaced out"]);
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        assert!(wrap_text("", 37).is_empty());
    }

    #[test]
    fn test_lines_fit_and_rejoin() {
        let text = "It was a dark and stormy night and the castle gates creaked open \
                    as you approached with nothing but a lantern and a map";
        for width in [1, 5, 12, 37, 200] {
            let lines = wrap_text(text, width);
            for line in &lines {
                assert!(
                    line.chars().count() <= width || !line.contains(' '),
                    "line {:?} exceeds width {}",
                    line,
                    width
                );
            }
            assert_eq!(lines.join(" "), text);
        }
    }
}
