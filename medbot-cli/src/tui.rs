//! Interactive terminal chat screen

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use medbot_core::render::{transcript_view, LineKind, RenderOptions, ViewLine};
use medbot_core::session::{ConversationSession, DISCLAIMER};
use medbot_core::ChatRequest;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io;
use tokio::sync::mpsc;
use tracing::{debug, info};

const SEND_LABEL: &str = "Send";

/// What a key press asks the loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Submit,
}

/// Screen state around one conversation session
pub struct ChatApp {
    session: ConversationSession,
    options: RenderOptions,
    scroll: u16,
    follow: bool,
    should_quit: bool,
    send_button: Rect,
}

impl ChatApp {
    pub fn new(session: ConversationSession, options: RenderOptions) -> Self {
        Self {
            session,
            options,
            scroll: 0,
            follow: true,
            should_quit: false,
            send_button: Rect::default(),
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Apply one key press to the input buffer or view
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Char('s') if ctrl => Action::Submit,
            KeyCode::Esc => Action::Quit,
            KeyCode::Enter => Action::Submit,
            KeyCode::Up | KeyCode::PageUp => {
                self.follow = false;
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            KeyCode::Down | KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(1);
                Action::None
            }
            KeyCode::End => {
                self.follow = true;
                Action::None
            }
            KeyCode::Backspace => {
                self.session.state_mut().backspace();
                Action::None
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.session.state_mut().push_char(ch);
                Action::None
            }
            _ => Action::None,
        }
    }

    /// A left click on the Send button submits, like Enter
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Action {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left)
                if self
                    .send_button
                    .contains(Position::new(mouse.column, mouse.row)) =>
            {
                Action::Submit
            }
            MouseEventKind::ScrollUp => {
                self.follow = false;
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            MouseEventKind::ScrollDown => {
                self.scroll = self.scroll.saturating_add(1);
                Action::None
            }
            _ => Action::None,
        }
    }

    /// Start a submit cycle; `None` when the session rejects it
    pub fn begin_submit(&mut self) -> Option<ChatRequest> {
        let request = self.session.state_mut().begin_submit()?;
        self.follow = true;
        Some(request)
    }

    fn apply_outcome(&mut self, outcome: medbot_core::Result<medbot_core::ChatReply>) {
        self.session.state_mut().complete(outcome);
        self.follow = true;
    }
}

/// Run the chat screen until the user quits
pub async fn run(app: ChatApp) -> Result<()> {
    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            restore_terminal();
            return Err(e);
        }
    };

    let result = event_loop(&mut terminal, app).await;

    restore_terminal();
    terminal.show_cursor()?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

/// Undo `setup_terminal`. Every step runs even if an earlier one fails.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = stdout.execute(DisableMouseCapture);
    let _ = stdout.execute(LeaveAlternateScreen);
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: ChatApp,
) -> Result<()> {
    let (outcome_tx, mut outcome_rx) =
        mpsc::unbounded_channel::<medbot_core::Result<medbot_core::ChatReply>>();

    loop {
        while let Ok(outcome) = outcome_rx.try_recv() {
            app.apply_outcome(outcome);
        }

        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(std::time::Duration::from_millis(60))? {
            let action = match event::read()? {
                CEvent::Key(key) => app.handle_key(key),
                CEvent::Mouse(mouse) => app.handle_mouse(mouse),
                _ => Action::None,
            };

            match action {
                Action::Quit => app.should_quit = true,
                Action::Submit => {
                    if let Some(request) = app.begin_submit() {
                        debug!("Submitting {} chars", request.message.len());
                        let service = app.session().service();
                        let tx = outcome_tx.clone();
                        tokio::spawn(async move {
                            let outcome = service.send(&request).await;
                            let _ = tx.send(outcome);
                        });
                    }
                }
                Action::None => {}
            }
        }

        if app.should_quit {
            info!("Leaving chat");
            break;
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, app: &mut ChatApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let state = app.session.state();
    let busy = state.is_busy();
    let input = state.input().to_string();
    let view = transcript_view(state, app.options);

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("MedBot", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                if busy { "  waiting for reply" } else { "  ready" },
                Style::default().fg(Color::DarkGray),
            ),
        ])),
        chunks[0],
    );

    frame.render_widget(
        Paragraph::new(DISCLAIMER)
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        chunks[1],
    );

    let inner_width = chunks[2].width.saturating_sub(2);
    let inner_height = chunks[2].height.saturating_sub(2);
    let lines = styled_lines(&view);
    let total = wrapped_height(&lines, inner_width);
    let max_scroll = total.saturating_sub(inner_height);
    if app.follow || app.scroll > max_scroll {
        app.scroll = max_scroll;
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("conversation"))
            .wrap(Wrap { trim: false })
            .scroll((app.scroll, 0)),
        chunks[2],
    );

    let input_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(10)])
        .split(chunks[3]);

    let input_title = if busy {
        "message (sending disabled)"
    } else {
        "message (Enter or Ctrl+S to send, Esc to quit)"
    };
    let input_style = if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    frame.render_widget(
        Paragraph::new(input.clone())
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).title(input_title)),
        input_row[0],
    );

    let button_style = if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    };
    frame.render_widget(
        Paragraph::new(SEND_LABEL)
            .style(button_style)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        input_row[1],
    );
    app.send_button = input_row[1];

    let typed = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    let max_x = input_row[0].width.saturating_sub(2);
    frame.set_cursor_position((input_row[0].x + 1 + typed.min(max_x), input_row[0].y + 1));
}

fn styled_lines(view: &[ViewLine]) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(view.len());
    let mut previous = None;
    for item in view {
        let first = item.message.is_none() || item.message != previous;
        previous = item.message;

        let (label, color) = match item.kind {
            LineKind::User => ("You: ", Color::Cyan),
            LineKind::Bot => ("MedBot: ", Color::Green),
            LineKind::Typing => {
                lines.push(Line::from(Span::styled(
                    item.text.clone(),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )));
                continue;
            }
        };

        let prefix = if first {
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
        } else {
            Span::raw(" ".repeat(label.len()))
        };
        lines.push(Line::from(vec![prefix, Span::raw(item.text.clone())]));
    }
    lines
}

/// Rows needed for `lines` when wrapped at `width` columns
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}
