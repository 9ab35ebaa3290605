//! Terminal rendering for chat replies and search results.

use lexdesk_core::{ChatMessage, Role, SearchState, SearchStatus};

const WRAP_WIDTH: usize = 88;

/// Print an assistant reply. User messages are already on screen as typed.
pub fn print_reply(message: &ChatMessage) {
    if message.role != Role::Assistant {
        return;
    }
    println!();
    println!("assistant  [{}]", message.timestamp);
    for paragraph in message.content.split('\n') {
        for line in wrap(paragraph, WRAP_WIDTH) {
            println!("  {line}");
        }
    }
    println!();
}

pub fn print_error(error: &str) {
    eprintln!("  ! {error}");
}

/// Print the match count and one snippet per match, marking the current one.
pub fn print_search_results(search: &SearchState, context: usize) {
    match search.status() {
        SearchStatus::Idle => {
            println!("(empty query)");
            return;
        }
        SearchStatus::NoMatches => {
            println!("\"{}\": no matches", search.query());
            return;
        }
        SearchStatus::At { total, .. } => {
            println!("\"{}\": {} match{}", search.query(), total, plural(total));
        }
    }
    println!();

    let current = search.current_index();
    for (i, m) in search.matches().iter().enumerate() {
        let marker = if i == current { '>' } else { ' ' };
        println!(
            "{marker} {:>4}  @{:<8} {}",
            i + 1,
            m.start,
            search.snippet(*m, context)
        );
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "es" }
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_width() {
        assert_eq!(
            wrap("the writ was served on the defendant", 12),
            vec!["the writ was", "served on", "the", "defendant"]
        );
    }

    #[test]
    fn wrap_keeps_blank_paragraph() {
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn wrap_long_word_alone() {
        assert_eq!(wrap("a supercalifragilistic b", 5), vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn plural_suffix() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(2), "es");
    }
}
