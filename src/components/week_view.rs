use chrono::{Duration, NaiveDate, Timelike};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::calendar::CalendarEvent;
use crate::theme;

const HOUR_START: u32 = 6;
const HOUR_END: u32 = 23;

pub struct WeekView;

impl WeekView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        selected_date: NaiveDate,
        today: NaiveDate,
        week_start: NaiveDate,
        events: &[&CalendarEvent],
    ) {
        let block = Block::default()
            .title(format!(" Week of {} ", week_start.format("%b %d, %Y")))
            .title_style(theme::current().header)
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.width < 10 || inner.height < 3 {
            return;
        }

        let time_col_w: u16 = if inner.width >= 70 { 6 } else { 4 };
        let col_w = (inner.width.saturating_sub(time_col_w) / 7).max(1);

        let mut col_constraints = vec![Constraint::Length(time_col_w)];
        col_constraints.extend((0..7).map(|_| Constraint::Length(col_w)));
        col_constraints.push(Constraint::Min(0));
        let cols = Layout::horizontal(col_constraints).split(inner);

        // One row is taken by the day headers
        let content_rows = (inner.height as usize).saturating_sub(1);
        let total_hours = (HOUR_END - HOUR_START) as usize;
        let rows_per_hour = (content_rows / total_hours).max(1);
        let visible_hours = (content_rows / rows_per_hour).min(total_hours);

        let mut row_constraints = vec![Constraint::Length(1)];
        row_constraints.extend((0..visible_hours).map(|_| Constraint::Length(rows_per_hour as u16)));
        row_constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(row_constraints).split(inner);

        for day_offset in 0..7usize {
            let date = week_start + Duration::days(day_offset as i64);
            let col = cols[day_offset + 1];

            let day_label = if col_w >= 10 {
                date.format("%a %d").to_string()
            } else if col_w >= 5 {
                date.format("%a").to_string()
            } else {
                date.format("%d").to_string()
            };

            let style = if date == today && date == selected_date {
                theme::current().today.add_modifier(Modifier::BOLD)
            } else if date == selected_date {
                theme::current().selected
            } else if date == today {
                theme::current().today
            } else {
                theme::current().header
            };

            let label = Paragraph::new(Line::from(Span::styled(
                format!("{:^width$}", day_label, width = col_w as usize),
                style,
            )));
            frame.render_widget(label, col.intersection(rows[0]));
        }

        for hour_idx in 0..visible_hours {
            let hour = HOUR_START + hour_idx as u32;
            let row = rows[hour_idx + 1];

            let time_label = if time_col_w >= 6 {
                format!("{:>2}:00 ", hour)
            } else {
                format!("{:>2} ", hour)
            };
            frame.render_widget(
                Paragraph::new(Span::styled(time_label, theme::current().dim)),
                cols[0].intersection(row),
            );

            for day_offset in 0..7usize {
                let date = week_start + Duration::days(day_offset as i64);
                let cell_area = cols[day_offset + 1].intersection(row);
                if cell_area.width == 0 || cell_area.height == 0 {
                    continue;
                }

                let Some(ev) = events.iter().find(|ev| in_slot(ev, date, hour)) else {
                    continue;
                };
                let width = cell_area.width as usize;
                let title: String = ev.title.chars().take(width).collect();
                let cell = Span::styled(format!("{:<width$}", title), theme::current().event);
                frame.render_widget(Paragraph::new(cell), cell_area);
            }
        }
    }
}

/// Whether `ev` covers `hour` on `date`. All-day events sit in the first row.
fn in_slot(ev: &CalendarEvent, date: NaiveDate, hour: u32) -> bool {
    if !ev.occurs_on(date) {
        return false;
    }
    if ev.is_all_day {
        return hour == HOUR_START;
    }
    let first = if ev.date() == date { ev.start.hour() } else { 0 };
    let last = match ev.end {
        Some(end) if end.date_naive() == date => {
            if end.minute() > 0 || end == ev.start {
                end.hour()
            } else {
                end.hour().saturating_sub(1)
            }
        }
        Some(_) => 23,
        None => ev.start.hour(),
    };
    hour >= first && hour <= last
}
