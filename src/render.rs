//! Plain-text rendering of the board.

use std::fmt::Write as _;

use join_protocol::{BoardSummary, BoardView, Card};

/// Renders the board view column by column, followed by the summary.
pub fn render_board(view: &BoardView, summary: &BoardSummary) -> String {
    let mut out = String::new();
    if !view.query.trim().is_empty() {
        let _ = writeln!(out, "Search: {}", view.query.trim());
    }
    for column in &view.columns {
        let _ = writeln!(
            out,
            "{} ({})",
            column.category.display_name(),
            column.cards.len()
        );
        for card in &column.cards {
            let _ = writeln!(out, "  - {}", card_line(card));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Tasks on board: {}", summary.total());
    match summary.urgent.next_due {
        Some(due) => {
            let _ = write!(out, "Urgent: {}, next due {due}", summary.urgent.count);
        }
        None => out.push_str("Urgent: none"),
    }
    out
}

fn card_line(card: &Card) -> String {
    let mut line = format!("{} [{}] {}", card.title, card.priority, card.progress);
    if let Some(due) = card.due_date {
        let _ = write!(line, ", due {due}");
    }
    if !card.assignees.is_empty() {
        let initials: Vec<&str> = card.assignees.iter().map(|a| a.initials.as_str()).collect();
        let _ = write!(line, ", {}", initials.join(" "));
    }
    line
}
