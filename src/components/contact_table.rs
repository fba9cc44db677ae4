use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::contacts::ContactsController;
use crate::theme;

const HEADERS: [&str; 5] = ["Contact Name", "Company", "Position", "Email", "Phone Number"];

pub struct ContactTable;

impl ContactTable {
    /// `selected` indexes into the filtered rows; `filter_active` shows the
    /// filter line with a cursor.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        contacts: &ContactsController,
        selected: Option<usize>,
        filter_active: bool,
    ) {
        let visible = contacts.visible();
        let pending = contacts.pending_adds();

        let total = contacts.contacts().len();
        let count = if contacts.filter().is_empty() {
            format!(" {} contacts ", total)
        } else {
            format!(" {} of {} contacts ", visible.len(), total)
        };

        let block = Block::default()
            .title(" Contacts ")
            .title_style(theme::current().header)
            .title_bottom(Line::from(Span::styled(count, theme::current().dim)))
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let show_filter = filter_active || !contacts.filter().is_empty();
        let layout = Layout::vertical([
            Constraint::Length(if show_filter { 1 } else { 0 }),
            Constraint::Min(1),
        ])
        .split(inner);

        if show_filter {
            let cursor = if filter_active { "_" } else { "" };
            let line = Line::from(vec![
                Span::styled("Filter: ", theme::current().dim),
                Span::raw(format!("{}{}", contacts.filter(), cursor)),
            ]);
            frame.render_widget(Paragraph::new(line), layout[0]);
        }

        let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h))).style(theme::current().header);

        let mut rows: Vec<Row> = visible
            .iter()
            .map(|c| {
                let style = if contacts.is_deleting(&c.id) {
                    theme::current().dim.add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };
                Row::new([
                    c.name.clone(),
                    c.company.clone(),
                    c.position.clone(),
                    c.email.clone(),
                    c.phone.clone(),
                ])
                .style(style)
            })
            .collect();

        // Rows the store has not confirmed yet sit below the list
        rows.extend(pending.iter().map(|p| {
            Row::new([
                format!("{} (saving)", p.record.name),
                p.record.company.clone(),
                p.record.position.clone(),
                p.record.email.clone(),
                p.record.phone.clone(),
            ])
            .style(theme::current().dim)
        }));

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(24),
                Constraint::Percentage(20),
                Constraint::Percentage(16),
                Constraint::Percentage(24),
                Constraint::Percentage(16),
            ],
        )
        .header(header)
        .row_highlight_style(theme::current().highlight)
        .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(selected);
        frame.render_stateful_widget(table, layout[1], &mut state);
    }
}
