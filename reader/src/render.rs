use crate::models::Role;
use crate::page::{StatusLine, Tone, UiState, View};
use console::style;
use std::io::{self, Write};

/// Line-oriented rendering of the page.
///
/// Only what changed since the previous frame is written, so the newest
/// chat entry is always the last thing on screen.
pub struct TerminalView<W> {
    out: W,
    shown_status: StatusLine,
    shown_status_revision: u64,
    shown_preview: Option<String>,
    shown_entries: usize,
    waiting: bool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown_status: StatusLine::default(),
            shown_status_revision: 0,
            shown_preview: None,
            shown_entries: 0,
            waiting: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, state: &UiState) -> io::Result<()> {
        if state.status != self.shown_status
            || state.status_revision != self.shown_status_revision
        {
            if !state.status.text.is_empty() {
                let text = style(&state.status.text);
                let text = match state.status.tone {
                    Tone::Neutral => text.dim(),
                    Tone::Success => text.green(),
                    Tone::Error => text.red(),
                };
                writeln!(self.out, "{}", text)?;
            }
            self.shown_status = state.status.clone();
            self.shown_status_revision = state.status_revision;
        }

        if state.preview_visible
            && self.shown_preview.as_deref() != Some(state.preview_text.as_str())
        {
            writeln!(self.out, "{}", style("── preview ──").bold())?;
            writeln!(self.out, "{}", state.preview_text)?;
            self.shown_preview = Some(state.preview_text.clone());
        }

        // Transcript was cleared by a new upload.
        if state.transcript.len() < self.shown_entries {
            writeln!(self.out, "{}", style("── new conversation ──").dim())?;
            self.shown_entries = 0;
        }

        for message in &state.transcript[self.shown_entries..] {
            let tag = match message.role {
                Role::User => style(format!("[{}]", message.role.as_str())).cyan(),
                Role::Assistant => style(format!("[{}]", message.role.as_str())).magenta(),
            };
            writeln!(self.out, "{} {}", tag, message.content)?;
        }
        self.shown_entries = state.transcript.len();

        if !state.send_enabled && !self.waiting {
            writeln!(self.out, "{}", style("waiting for answer…").dim())?;
        }
        self.waiting = !state.send_enabled;

        self.out.flush()
    }
}

impl<W: Write> View for TerminalView<W> {
    fn render(&mut self, state: &UiState) {
        if let Err(err) = self.draw(state) {
            log::error!("Failed to draw page: {}", err);
        }
    }
}
