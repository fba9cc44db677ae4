mod app;
mod calendar;
mod components;
mod config;
mod contacts;
mod error;
mod event;
mod logging;
mod model;
mod notify;
mod store;
mod theme;
mod tui;

use std::time::Duration;

use app::{App, InputMode, Screen, ViewMode, NUDGE_MINUTES};
use chrono::Datelike;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};

use components::event_form::FormField;

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = config::Config::load()?;
    let log_path = logging::init()?;
    tracing::info!(
        org = %config.org_id,
        backend = ?config.backend,
        log = %log_path.display(),
        "starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let stores = store::connect(&config)?;
    let mut app = App::new(&config, stores, runtime.handle().clone());
    app.start();

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;

    tracing::info!("shutting down");
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.drain_messages();

        terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: content + status bar
            let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
            let content_area = layout[0];

            match app.screen {
                Screen::Calendar => render_calendar(frame, content_area, app),
                Screen::Contacts => components::ContactTable::render(
                    frame,
                    content_area,
                    &app.contacts,
                    Some(app.contact_selection),
                    app.input_mode == InputMode::Filter,
                ),
            }

            if app.show_detail {
                if let Some(ev) = app.selected_event() {
                    components::day_view::render_detail_popup(frame, area, ev);
                }
            }

            if let Some(ref form) = app.event_form {
                components::EventForm::render(frame, area, form, app.calendar.options());
            }

            if let Some(ref form) = app.contact_form {
                components::ContactForm::render(frame, area, form);
            }

            if app.show_help {
                render_help(frame, area);
            }

            components::StatusBar::render(
                frame,
                layout[1],
                app.screen,
                app.view_mode,
                app.input_mode,
                app.toast.as_ref(),
            );
        })?;

        if let Some(key) = event::next_key_press(Duration::from_millis(100))? {
            // Help overlay takes priority
            if app.show_help {
                if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                    app.show_help = false;
                }
                continue;
            }

            match app.input_mode {
                InputMode::EventForm => handle_event_form_input(app, key.code),
                InputMode::ContactForm => handle_contact_form_input(app, key.code),
                InputMode::Filter => handle_filter_input(app, key.code),
                InputMode::Normal if app.show_detail => handle_detail_input(app, key.code),
                InputMode::Normal => match app.screen {
                    Screen::Calendar => handle_calendar_input(app, key.code, key.modifiers),
                    Screen::Contacts => handle_contacts_input(app, key.code, key.modifiers),
                },
            }
        }
    }

    Ok(())
}

fn nudge(minutes: i64) -> chrono::Duration {
    chrono::Duration::minutes(minutes)
}

fn handle_calendar_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Tab, _) => app.toggle_screen(),
        (KeyCode::Char('1'), _) => app.view_mode = ViewMode::Month,
        (KeyCode::Char('2'), _) => app.view_mode = ViewMode::Week,
        (KeyCode::Char('3'), _) => app.view_mode = ViewMode::Day,
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Char('r'), _) => app.reload_calendar(),
        (KeyCode::Char('n'), _) => app.open_event_form(),
        (KeyCode::Char('e'), _) => app.edit_selected_event(),
        (KeyCode::Char('d'), _) => app.dismiss_selected(),
        (KeyCode::Enter, _) => app.open_detail(),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.prev_day(),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.next_day(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
            if app.view_mode == ViewMode::Week {
                app.prev_week();
            } else {
                app.select_prev_event();
            }
        }
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
            if app.view_mode == ViewMode::Week {
                app.next_week();
            } else {
                app.select_next_event();
            }
        }
        // Drag the selected event
        (KeyCode::Char('H'), _) => app.shift_selected(chrono::Duration::days(-1)),
        (KeyCode::Char('L'), _) => app.shift_selected(chrono::Duration::days(1)),
        (KeyCode::Char('K'), _) => app.shift_selected(nudge(-NUDGE_MINUTES)),
        (KeyCode::Char('J'), _) => app.shift_selected(nudge(NUDGE_MINUTES)),
        (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => {
            app.resize_selected(nudge(NUDGE_MINUTES))
        }
        (KeyCode::Char('-'), _) => app.resize_selected(nudge(-NUDGE_MINUTES)),
        (KeyCode::Char('['), _) => app.prev_month(),
        (KeyCode::Char(']'), _) => app.next_month(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_detail_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Enter => app.close_detail(),
        KeyCode::Char('e') => app.edit_selected_event(),
        KeyCode::Char('d') => app.dismiss_selected(),
        _ => {}
    }
}

fn handle_contacts_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Tab, _) => app.toggle_screen(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.select_prev_contact(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.select_next_contact(),
        (KeyCode::Char('a'), _) => app.open_add_contact(),
        (KeyCode::Char('e'), _) | (KeyCode::Enter, _) => app.open_edit_contact(),
        (KeyCode::Char('d'), _) => app.delete_selected_contact(),
        (KeyCode::Char('/'), _) => app.input_mode = InputMode::Filter,
        (KeyCode::Esc, _) => app.clear_filter(),
        (KeyCode::Char('x'), _) => app.export_contacts(),
        (KeyCode::Char('r'), _) => app.reload_contacts(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_filter_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.clear_filter();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Backspace => app.filter_pop(),
        KeyCode::Char(c) => app.filter_push(c),
        _ => {}
    }
}

fn handle_event_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_event_form(),
        KeyCode::Enter => app.submit_event_form(),
        _ => {
            let options = app.calendar.options();
            let Some(form) = app.event_form.as_mut() else {
                return;
            };
            match code {
                KeyCode::Tab => form.active_field = form.active_field.next(),
                KeyCode::BackTab => form.active_field = form.active_field.prev(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Down => form.cycle_option(options),
                KeyCode::Char(' ') if form.active_field == FormField::AllDay => {
                    form.toggle_all_day()
                }
                KeyCode::Char(c) => form.input_char(c),
                _ => {}
            }
        }
    }
}

fn handle_contact_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_contact_form(),
        KeyCode::Enter => app.submit_contact_form(),
        _ => {
            let Some(form) = app.contact_form.as_mut() else {
                return;
            };
            match code {
                KeyCode::Tab => form.next_field(),
                KeyCode::BackTab => form.prev_field(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.input_char(c),
                _ => {}
            }
        }
    }
}

fn render_calendar(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    match app.view_mode {
        ViewMode::Month => render_month_layout(frame, area, app),
        ViewMode::Week => components::WeekView::render(
            frame,
            area,
            app.selected_date,
            app.today,
            app.week_start(),
            &app.week_events(),
        ),
        ViewMode::Day => components::DayView::render(
            frame,
            area,
            app.selected_date,
            &app.day_events(),
            Some(app.day_selection),
        ),
    }
}

fn render_month_layout(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let days_with_events = app
        .calendar
        .events()
        .days_with_events(app.selected_date.year(), app.selected_date.month());

    if area.width < 60 {
        components::MonthView::render(frame, area, app.selected_date, app.today, &days_with_events);
        return;
    }

    let month_w = if area.width >= 100 { 44 } else { 37 };
    let content = Layout::horizontal([Constraint::Length(month_w), Constraint::Min(20)]).split(area);

    components::MonthView::render(
        frame,
        content[0],
        app.selected_date,
        app.today,
        &days_with_events,
    );
    components::DayView::render(
        frame,
        content[1],
        app.selected_date,
        &app.day_events(),
        Some(app.day_selection),
    );
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let popup_w = area.width.min(56).max(30);
    let popup_h = area.height.min(30).max(12);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" Keybindings ({}) ", theme::current().name))
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let binding = |keys: &str, desc: &str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", keys), theme::KEY_STYLE),
            Span::raw(desc.to_string()),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Calendar", section_style)),
        binding("h/l", "Previous/next day"),
        binding("j/k", "Select event (week view: next/prev week)"),
        binding("[/]", "Previous/next month"),
        binding("t", "Jump to today"),
        binding("1/2/3", "Month / Week / Day view"),
        binding("Enter", "Event details"),
        binding("n", "New interaction"),
        binding("e", "Edit selected interaction"),
        binding("d", "Delete selected interaction"),
        binding("H/L", "Move event a day earlier/later"),
        binding("K/J", "Move event 15 min earlier/later"),
        binding("+/-", "Lengthen/shorten event by 15 min"),
        binding("r", "Reload"),
        Line::from(""),
        Line::from(Span::styled("Contacts", section_style)),
        binding("j/k", "Select row"),
        binding("a", "Add contact"),
        binding("e", "Edit contact"),
        binding("d", "Delete contact"),
        binding("/", "Filter rows (Esc clears)"),
        binding("x", "Export shown rows to CSV"),
        Line::from(""),
        binding("Tab", "Switch screen"),
        Line::from(vec![
            Span::styled("  q", theme::KEY_STYLE),
            Span::styled(" / ", theme::DIM_STYLE),
            Span::styled("Esc     ", theme::KEY_STYLE),
            Span::raw("Quit / close popup"),
        ]),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
