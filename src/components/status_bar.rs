use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{InputMode, Screen, ViewMode};
use crate::notify::{Level, Toast};
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        screen: Screen,
        view: ViewMode,
        mode: InputMode,
        toast: Option<&Toast>,
    ) {
        let w = area.width as usize;
        let status = theme::current().status;

        let screen_str = match screen {
            Screen::Calendar => match view {
                ViewMode::Month => "Calendar [1]Month",
                ViewMode::Week => "Calendar [2]Week",
                ViewMode::Day => "Calendar [3]Day",
            },
            Screen::Contacts => "Contacts",
        };
        let focus = match mode {
            InputMode::EventForm => " [Interaction]",
            InputMode::ContactForm => " [Contact]",
            InputMode::Filter => " [Filter]",
            InputMode::Normal => "",
        };
        let left = format!(" {}{} ", screen_str, focus);

        let (right, right_style) = match toast {
            Some(t) => {
                let style = match t.notification.level {
                    Level::Success => theme::current().success,
                    Level::Error => theme::current().error,
                };
                (format!(" {} ", t.notification.message), style)
            }
            None => (hints(screen, w).to_string(), status),
        };

        let padding = " ".repeat(w.saturating_sub(left.chars().count() + right.chars().count()));

        let line = Line::from(vec![
            Span::styled(left, status),
            Span::styled(padding, status),
            Span::styled(right, right_style),
        ]);
        frame.render_widget(Paragraph::new(line).style(status), area);
    }
}

fn hints(screen: Screen, w: usize) -> &'static str {
    match screen {
        Screen::Calendar if w >= 90 => {
            " hl:Day jk:Select HL/JK:Move +/-:Resize n:New e:Edit d:Dismiss Tab:Contacts ?:Help q:Quit"
        }
        Screen::Calendar if w >= 50 => " n:New e:Edit d:Dismiss Tab:Contacts q:Quit",
        Screen::Contacts if w >= 70 => " jk:Select a:Add e:Edit d:Delete /:Filter x:Export Tab:Calendar q:Quit",
        Screen::Contacts if w >= 50 => " a:Add e:Edit d:Delete /:Filter q:Quit",
        _ => " ?:Help q:Quit",
    }
}
