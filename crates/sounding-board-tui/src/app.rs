use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sounding_board_core::state::export_file_name;
use sounding_board_core::{ChatMessage, ChatReply, Conversation, ProxyClient};
use tokio::task::JoinHandle;

pub const SEND_FAILED_MESSAGE: &str = "Failed to send message";

/// Where the current send stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending,
    /// Shown as a modal alert until the next key press
    Error(String),
}

pub struct App {
    pub should_quit: bool,

    // Conversation state
    pub conversation: Conversation,
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars
    pub send_state: SendState,
    pub pending: Option<JoinHandle<Result<ChatReply>>>,

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub chat_width: u16,  // inner width of the chat area, set during render
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Footer status line (export results)
    pub status: Option<String>,

    pub proxy: ProxyClient,
    pub export_dir: PathBuf,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl App {
    pub fn new(proxy: ProxyClient, export_dir: PathBuf) -> Self {
        Self {
            should_quit: false,
            conversation: Conversation::new(),
            input: String::new(),
            input_cursor: 0,
            send_state: SendState::Idle,
            pending: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            status: None,
            proxy,
            export_dir,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.send_state == SendState::Sending
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.send_state {
            SendState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Whether the send action is enabled
    pub fn can_send(&self) -> bool {
        !self.is_loading() && !self.input.trim().is_empty()
    }

    /// Start a send: append the user's message and hand back the conversation
    /// to post. Returns `None` without touching state when there is nothing
    /// to send or a send is already in flight.
    pub fn begin_send(&mut self) -> Option<Vec<ChatMessage>> {
        if !self.can_send() {
            return None;
        }

        let content = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        self.conversation.push_user(content);
        self.send_state = SendState::Sending;
        self.status = None;
        self.scroll_to_bottom();

        Some(self.conversation.messages().to_vec())
    }

    /// Apply the outcome of the request started by `begin_send`
    pub fn finish_send(&mut self, result: Result<ChatReply>) {
        self.send_state = match result {
            Ok(ChatReply { error: Some(error), .. }) => {
                log::warn!("chat server returned an error: {}", error);
                SendState::Error(format!("Error: {}", error))
            }
            Ok(ChatReply { message: Some(message), .. }) => {
                self.conversation.push_assistant(message);
                SendState::Idle
            }
            Ok(_) => {
                log::error!("chat server reply had neither message nor error");
                SendState::Error(SEND_FAILED_MESSAGE.to_string())
            }
            Err(e) => {
                log::error!("{:#}", e);
                SendState::Error(SEND_FAILED_MESSAGE.to_string())
            }
        };
        self.scroll_to_bottom();
    }

    /// Spawn the request for a send started by `begin_send`
    pub fn spawn_send(&mut self, messages: Vec<ChatMessage>) {
        let proxy = self.proxy.clone();
        self.pending = Some(tokio::spawn(async move { proxy.send(messages).await }));
    }

    /// Collect the in-flight request if it has completed
    pub async fn poll_pending(&mut self) {
        let finished = self.pending.as_ref().is_some_and(|h| h.is_finished());
        if !finished {
            return;
        }

        if let Some(handle) = self.pending.take() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("send task failed: {}", e)),
            };
            self.finish_send(result);
        }
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.send_state, SendState::Error(_)) {
            self.send_state = SendState::Idle;
        }
    }

    /// Handle a key aimed at the input box.
    ///
    /// Enter sends, Shift+Enter (or Alt+Enter) inserts a newline. Returns the
    /// conversation to post when a send begins. Typing is ignored while a
    /// send is in flight.
    pub fn handle_input_key(&mut self, key: KeyEvent) -> Option<Vec<ChatMessage>> {
        if self.is_loading() {
            return None;
        }

        match key.code {
            KeyCode::Enter
                if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                self.insert_char('\n');
                None
            }
            KeyCode::Enter => self.begin_send(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_char(c);
                None
            }
            KeyCode::Backspace => {
                if self.input_cursor > 0 {
                    self.input_cursor -= 1;
                    let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
                    self.input.remove(byte_pos);
                }
                None
            }
            KeyCode::Delete => {
                if self.input_cursor < self.input.chars().count() {
                    let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
                    self.input.remove(byte_pos);
                }
                None
            }
            KeyCode::Left => {
                self.input_cursor = self.input_cursor.saturating_sub(1);
                None
            }
            KeyCode::Right => {
                self.input_cursor = (self.input_cursor + 1).min(self.input.chars().count());
                None
            }
            KeyCode::Home => {
                self.input_cursor = 0;
                None
            }
            KeyCode::End => {
                self.input_cursor = self.input.chars().count();
                None
            }
            _ => None,
        }
    }

    fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    /// Write the transcript to `conversation-<date>.txt` in the export
    /// directory. Does nothing for an empty conversation.
    pub fn export_conversation(&mut self, date: NaiveDate) -> Result<Option<PathBuf>> {
        if self.conversation.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("Failed to create {}", self.export_dir.display()))?;
        let path = self.export_dir.join(export_file_name(date));
        fs::write(&path, self.conversation.transcript())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!("exported {} messages to {}", self.conversation.len(), path.display());
        Ok(Some(path))
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.visible_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
    }

    /// Scroll chat to bottom so the newest message (or "Thinking...") is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.total_chat_lines().saturating_sub(self.visible_height());
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 { self.chat_height } else { 20 }
    }

    /// Rendered line count of the chat, matching the layout in `ui::chat_lines`
    /// Clamped to `u16::MAX`, the widest scroll offset ratatui accepts.
    fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };
        let mut total_lines: usize = 0;

        for msg in self.conversation.messages() {
            total_lines += 1; // Role line
            for line in msg.content.split('\n') {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines += char_count / wrap_width + 1;
            }
            total_lines += 1; // Blank line after message
        }

        if self.is_loading() {
            total_lines += 2; // Role line + "Thinking..."
        }

        u16::try_from(total_lines).unwrap_or(u16::MAX)
    }
}
