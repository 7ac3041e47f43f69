// ABOUTME: Local chat state for client applications
// ABOUTME: Merges live socket events and fetched history into one deduplicated view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

use crate::models::{ConversationSummary, Message, UserProfile};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// One conversation as the client currently knows it
#[derive(Debug, Clone)]
pub struct CachedConversation {
    /// Conversation id
    pub id: Uuid,
    /// Job the conversation is about, when known
    pub job_id: Option<Uuid>,
    /// The other participant; `None` until a summary fetch fills it in
    pub counterpart: Option<UserProfile>,
    /// Latest known message
    pub last_message: Option<Message>,
    /// Latest known activity timestamp
    pub last_message_at: DateTime<Utc>,
}

/// Client-side cache of conversations and message sequences.
///
/// All inputs (live socket events, fetched history pages, summary lists)
/// flow through the same idempotent merge, so the cache converges to one
/// consistent view regardless of arrival order.
#[derive(Debug, Default)]
pub struct ChatCache {
    conversations: HashMap<Uuid, CachedConversation>,
    // recency order, most recent first
    order: Vec<Uuid>,
    messages: HashMap<Uuid, Vec<Message>>,
    seen: HashSet<Uuid>,
}

impl ChatCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one message into the cache.
    ///
    /// Returns `true` if the message was new. Duplicate ids are skipped,
    /// so replaying a history page over live-delivered messages is a
    /// no-op. A message for an unknown conversation creates a placeholder
    /// entry at the front of the list.
    pub fn merge_message(&mut self, message: &Message) -> bool {
        if !self.seen.insert(message.id) {
            return false;
        }

        let sequence = self.messages.entry(message.conversation_id).or_default();
        // Usually a tail append; history pages may splice in older entries
        let position = sequence
            .iter()
            .rposition(|m| m.created_at <= message.created_at)
            .map_or(0, |i| i + 1);
        sequence.insert(position, message.clone());

        let entry = self
            .conversations
            .entry(message.conversation_id)
            .or_insert_with(|| CachedConversation {
                id: message.conversation_id,
                job_id: None,
                counterpart: None,
                last_message: None,
                last_message_at: message.created_at,
            });

        // Only activity newer than what we know advances recency
        if entry
            .last_message
            .as_ref()
            .is_none_or(|last| last.created_at <= message.created_at)
        {
            entry.last_message = Some(message.clone());
            entry.last_message_at = message.created_at;
            self.move_to_front(message.conversation_id);
        } else if !self.order.contains(&message.conversation_id) {
            self.order.push(message.conversation_id);
        }

        true
    }

    /// Merge a fetched history page.
    ///
    /// Pages are merged message by message through [`Self::merge_message`];
    /// returns how many messages were new.
    pub fn merge_history_page(&mut self, messages: &[Message]) -> usize {
        messages
            .iter()
            .filter(|message| self.merge_message(message))
            .count()
    }

    /// Merge a fetched conversation summary list.
    ///
    /// Fills in counterpart and job details and folds in any last message
    /// the server knows about, without discarding locally cached messages.
    pub fn merge_summaries(&mut self, summaries: Vec<ConversationSummary>) {
        for summary in summaries {
            if let Some(last_message) = &summary.last_message {
                self.merge_message(last_message);
            }

            let entry = self
                .conversations
                .entry(summary.id)
                .or_insert_with(|| CachedConversation {
                    id: summary.id,
                    job_id: None,
                    counterpart: None,
                    last_message: None,
                    last_message_at: summary.last_message_at,
                });
            entry.job_id = summary.job_id.or(entry.job_id);
            entry.counterpart = Some(summary.counterpart);
            if entry.last_message_at < summary.last_message_at {
                entry.last_message_at = summary.last_message_at;
            }

            if !self.order.contains(&summary.id) {
                self.order.push(summary.id);
            }
        }

        // Re-sort so server-known recency and local merges agree
        let conversations = &self.conversations;
        self.order.sort_by(|a, b| {
            let at = conversations.get(a).map(|c| c.last_message_at);
            let bt = conversations.get(b).map(|c| c.last_message_at);
            bt.cmp(&at)
        });
    }

    /// Conversations in recency order, most recent first
    #[must_use]
    pub fn conversations(&self) -> Vec<&CachedConversation> {
        self.order
            .iter()
            .filter_map(|id| self.conversations.get(id))
            .collect()
    }

    /// A conversation's cached messages, oldest first
    #[must_use]
    pub fn messages(&self, conversation_id: Uuid) -> &[Message] {
        self.messages
            .get(&conversation_id)
            .map_or(&[], Vec::as_slice)
    }

    fn move_to_front(&mut self, conversation_id: Uuid) {
        self.order.retain(|id| *id != conversation_id);
        self.order.insert(0, conversation_id);
    }
}
