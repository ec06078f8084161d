//! AI Chat Commands
//!
//! A chat transcript backed by `POST /ai/generate`. Any part of a message can
//! be saved into the workspace as a note.

use std::ops::Range;
use std::sync::{MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::api::AiGenerateRequest;
use crate::domain::{DomainError, Item, ItemType};
use crate::store::NoticeLevel;
use super::{CommandResult, NewItem, Organizer};

const EXCERPT_TITLE_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// One paragraph per non-empty line
fn excerpt_to_html(excerpt: &str) -> String {
    excerpt
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect()
}

/// First line, cut to a readable length
fn excerpt_title(excerpt: &str) -> String {
    let first = excerpt.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
    let mut title: String = first.chars().take(EXCERPT_TITLE_CHARS).collect();
    if first.chars().count() > EXCERPT_TITLE_CHARS {
        title.push('…');
    }
    title
}

impl Organizer {
    fn transcript_lock(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript_lock().clone()
    }

    pub fn clear_transcript(&self) {
        self.transcript_lock().clear();
    }

    /// Ask the assistant about `topic` in the context of the current workspace
    pub async fn ask_ai(&self, topic: &str) -> CommandResult<String> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(DomainError::InvalidInput("question is empty".to_string()).into());
        }
        let workspace_id = self.current_workspace()?;

        self.transcript_lock().push(ChatMessage { role: ChatRole::User, text: topic.to_string() });

        let request = AiGenerateRequest {
            topic: topic.to_string(),
            workspace_id,
            user_id: self.user_id.clone(),
        };
        let response = match self.api().ai_generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.store_ref()
                    .notify(NoticeLevel::Error, format!("AI request failed: {}", e));
                return Err(e.into());
            }
        };

        if let Some(structure) = &response.structure {
            log::debug!("AI suggested structure: {}", structure);
        }
        self.transcript_lock().push(ChatMessage {
            role: ChatRole::Assistant,
            text: response.response.clone(),
        });
        Ok(response.response)
    }

    /// Save characters `range` of transcript message `message_index` as a new
    /// note, optionally inside `parent_id`
    pub async fn save_excerpt_as_note(
        &self,
        message_index: usize,
        range: Range<usize>,
        parent_id: Option<&str>,
    ) -> CommandResult<Item> {
        let message = self
            .transcript_lock()
            .get(message_index)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("chat message {}", message_index)))?;

        let excerpt: String = message
            .text
            .chars()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect();
        let excerpt = excerpt.trim();
        if excerpt.is_empty() {
            return Err(DomainError::InvalidInput("selected text is empty".to_string()).into());
        }

        let mut new_item = NewItem::new(ItemType::Note, excerpt_title(excerpt))
            .with_content(excerpt_to_html(excerpt));
        if let Some(parent) = parent_id {
            new_item = new_item.under(parent);
        }
        self.create_item(new_item).await
    }
}
