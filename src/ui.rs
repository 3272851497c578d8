use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{app::App, clock::Clock, spinner::Phase};

const HORIZONTAL_MARGIN: u16 = 2;
const HELP: &str =
    "(enter) add / spin  (tab) spin  (↑/↓) select  (del) remove  (ctrl+l) clear  (esc) quit";

/// Keeps the tail of `text` that fits in `width` columns
fn tail_fitting(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut start = text.len();
    for (idx, _) in text.char_indices().rev() {
        if text[idx..].width() > width {
            break;
        }
        start = idx;
    }
    &text[start..]
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let highlight_style = Style::default()
            .patch(bold_style)
            .fg(Color::Black)
            .bg(Color::Yellow);
        let winner_style = Style::default()
            .patch(bold_style)
            .fg(Color::Black)
            .bg(Color::Green);

        let phase = self.spinner.phase();
        let spinning = phase == Phase::Running;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(3), // input
                Constraint::Min(3),    // options
                Constraint::Length(1), // progress
                Constraint::Length(1), // result / status
                Constraint::Length(1), // help
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("whirl", bold_style.fg(Color::Magenta)),
            Span::raw("  "),
            Span::styled(
                phase.to_string(),
                if spinning {
                    bold_style.fg(Color::Yellow)
                } else {
                    dim_style
                },
            ),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        let input_width = chunks[1].width.saturating_sub(3) as usize;
        let input_line = Line::from(vec![
            Span::raw(tail_fitting(&self.input, input_width)),
            Span::styled(
                "▏",
                Style::default().add_modifier(Modifier::SLOW_BLINK),
            ),
        ]);
        let input_title = if self.store.is_frozen() {
            "New option (locked)"
        } else {
            "New option"
        };
        Paragraph::new(input_line)
            .block(Block::default().borders(Borders::ALL).title(input_title))
            .render(chunks[1], buf);

        let highlight = self.spinner.highlight_index();
        let winner = self.spinner.final_index();
        let lines: Vec<Line> = if self.store.is_empty() {
            vec![Line::styled("no options yet, type one and press enter", dim_style)]
        } else {
            self.store
                .labels()
                .iter()
                .enumerate()
                .map(|(idx, label)| {
                    let marker = if !spinning && self.selected == Some(idx) {
                        "› "
                    } else {
                        "  "
                    };
                    let style = if spinning && highlight == Some(idx) {
                        highlight_style
                    } else if !spinning && winner == Some(idx) {
                        winner_style
                    } else {
                        Style::default()
                    };
                    Line::from(vec![
                        Span::raw(marker),
                        Span::styled(format!(" {} ", label), style),
                    ])
                })
                .collect()
        };
        let list_title = format!("Options ({})", self.store.count());
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(list_title))
            .render(chunks[2], buf);

        if let Some(ratio) = self.progress() {
            Gauge::default()
                .gauge_style(Style::default().fg(Color::Yellow))
                .ratio(ratio.clamp(0.0, 1.0))
                .label("")
                .render(chunks[3], buf);
        }

        let result_line = match (self.spinner.final_selection(), &self.status) {
            (_, Some(status)) => Line::styled(status.as_str(), Style::default().fg(Color::Red)),
            (Some(choice), None) if !spinning => Line::from(vec![
                Span::raw("→ "),
                Span::styled(choice, bold_style.fg(Color::Green)),
            ]),
            _ => Line::raw(""),
        };
        Paragraph::new(result_line)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        Paragraph::new(Span::styled(HELP, dim_style.add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[5], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, options::OptionStore, spinner::SpinScheduler};
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered<C: Clock>(app: &App<C>) -> String {
        let backend = TestBackend::new(100, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(app, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn tail_fitting_keeps_the_end() {
        assert_eq!(tail_fitting("hello", 10), "hello");
        assert_eq!(tail_fitting("hello world", 5), "world");
        assert_eq!(tail_fitting("", 0), "");
    }

    #[test]
    fn renders_empty_state() {
        let clock = ManualClock::new(0);
        let app = App::new(OptionStore::new(), SpinScheduler::with_seed(1), &clock);
        let content = rendered(&app);
        assert!(content.contains("no options yet"));
        assert!(content.contains("Idle"));
    }

    #[test]
    fn renders_options_and_result() {
        let clock = ManualClock::new(0);
        let mut app = App::new(
            OptionStore::from_labels(["Sushi", "Pizza"]),
            SpinScheduler::with_seed(1),
            &clock,
        );
        assert!(app.spin());
        let content = rendered(&app);
        assert!(content.contains("Running"));
        assert!(content.contains("(locked)"));
        assert!(content.contains("Sushi"));

        clock.advance(5_000);
        let choice = app.on_tick().unwrap();
        let content = rendered(&app);
        assert!(content.contains(&format!("→ {}", choice)));
        assert!(content.contains("Idle"));
    }

    #[test]
    fn renders_status_message() {
        let clock = ManualClock::new(0);
        let mut app = App::new(OptionStore::new(), SpinScheduler::with_seed(1), &clock);
        app.spin();
        assert!(rendered(&app).contains("add at least 2 options to spin"));
    }
}
