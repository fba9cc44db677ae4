use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::calendar::CalendarEvent;
use crate::theme;

pub struct DayView;

impl DayView {
    /// `events` are the day's events in display order (all-day first);
    /// `selected` indexes into them.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        events: &[&CalendarEvent],
        selected: Option<usize>,
    ) {
        let w = area.width as usize;

        let title = if w >= 30 {
            format!(" {} ", date.format("%A, %B %d, %Y"))
        } else if w >= 18 {
            format!(" {} ", date.format("%b %d, %Y"))
        } else {
            format!(" {} ", date.format("%m/%d"))
        };

        let count_str = match events.len() {
            0 => String::new(),
            1 => " 1 interaction ".to_string(),
            n => format!(" {} interactions ", n),
        };

        let block = Block::default()
            .title(title)
            .title_style(theme::current().header)
            .title_bottom(Line::from(Span::styled(count_str, theme::current().dim)))
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        if events.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No interactions").style(theme::current().dim);
            frame.render_widget(msg, inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = events.iter().map(|ev| format_event(ev, inner_w)).collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme::current().highlight)
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(selected);
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn format_event(ev: &CalendarEvent, max_width: usize) -> ListItem<'static> {
    let marker = Span::styled("  ", theme::current().event);

    let time_str = if ev.is_all_day {
        " All day ".to_string()
    } else {
        format!(" {} ", ev.duration_display())
    };
    let time_span = Span::styled(time_str.clone(), Style::default().add_modifier(Modifier::DIM));

    let title_span = Span::styled(ev.title.clone(), Style::default());

    let mut spans = vec![marker, time_span, title_span];

    // Only show the type if there's room
    let used = 2 + time_str.len() + ev.title.len();
    if !ev.kind.is_empty() && used + 3 + ev.kind.len() <= max_width {
        spans.push(Span::styled(format!(" [{}]", ev.kind), theme::current().dim));
    }

    ListItem::new(Line::from(spans))
}

/// Overlay with the full details of one interaction.
pub fn render_detail_popup(frame: &mut Frame, area: Rect, ev: &CalendarEvent) {
    let popup_w = area.width.min(60).max(30);
    let popup_h = area.height.min(16).max(8);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" {} ", ev.title))
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines: Vec<Line> = Vec::new();

    if let Some(ref contact) = ev.contact_name {
        lines.push(Line::from(vec![
            Span::styled("Contact: ", theme::current().dim),
            Span::styled(contact.clone(), Style::default()),
        ]));
    }
    if !ev.kind.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Type: ", theme::current().dim),
            Span::styled(ev.kind.clone(), Style::default()),
        ]));
    }

    lines.push(Line::from(""));
    if ev.is_all_day {
        lines.push(Line::from(Span::styled("All day", theme::current().dim)));
    } else {
        lines.push(Line::from(vec![
            Span::styled("Time: ", theme::current().dim),
            Span::styled(ev.duration_display(), Style::default()),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Date: ", theme::current().dim),
        Span::styled(ev.start.format("%A, %B %d, %Y").to_string(), Style::default()),
    ]));

    if !ev.notes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Notes:", theme::current().dim)));
        for line in ev.notes.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("e", theme::KEY_STYLE),
        Span::styled(":Edit  ", theme::current().dim),
        Span::styled("d", theme::KEY_STYLE),
        Span::styled(":Delete  ", theme::current().dim),
        Span::styled("Esc", theme::KEY_STYLE),
        Span::styled(":Close", theme::current().dim),
    ]));

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
