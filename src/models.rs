// ABOUTME: Common data models for conversations, messages and participants
// ABOUTME: Wire-level types shared by the server routes, the gateway and the client cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! Shared data models for the chat subsystem

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side of the marketplace a participant belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Posts jobs, initiates hires
    Employer,
    /// Applies to jobs
    Seeker,
}

impl UserRole {
    /// Stable string form used in storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Seeker => "seeker",
        }
    }

    /// Parse the stored string form
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "employer" => Some(Self::Employer),
            "seeker" => Some(Self::Seeker),
            _ => None,
        }
    }
}

/// Public profile of a chat participant, mirrored from the identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Participant id
    pub id: Uuid,
    /// Display name shown next to messages
    pub display_name: String,
    /// Optional avatar URL
    pub avatar_url: Option<String>,
    /// Marketplace role
    pub role: UserRole,
}

/// A durable conversation between one employer and one job seeker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation id, assigned at creation and immutable
    pub id: Uuid,
    /// Originating job; required at creation, optional thereafter
    pub job_id: Option<Uuid>,
    /// Employer participant
    pub employer_id: Uuid,
    /// Job-seeker participant
    pub seeker_id: Uuid,
    /// Recency marker, advanced with every appended message
    pub last_message_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Whether `user_id` is one of the two participants
    #[must_use]
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.employer_id == user_id || self.seeker_id == user_id
    }

    /// The participant facing `user_id`, if `user_id` is a participant
    #[must_use]
    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.employer_id == user_id {
            Some(self.seeker_id)
        } else if self.seeker_id == user_id {
            Some(self.employer_id)
        } else {
            None
        }
    }
}

/// A single chat message; immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message id, globally unique
    pub id: Uuid,
    /// Owning conversation
    pub conversation_id: Uuid,
    /// Sending participant
    pub sender_id: Uuid,
    /// Resolved sender display name, for immediate rendering
    pub sender_name: String,
    /// Resolved sender avatar, if any
    pub sender_avatar: Option<String>,
    /// Text content
    pub content: String,
    /// Read flag; stored only, no transition protocol
    pub is_read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Conversation summary as rendered in a participant's chat list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation id
    pub id: Uuid,
    /// Originating job reference
    pub job_id: Option<Uuid>,
    /// The other participant's profile
    pub counterpart: UserProfile,
    /// Most recent message, if the conversation has any
    pub last_message: Option<Message>,
    /// Recency marker used for ordering
    pub last_message_at: DateTime<Utc>,
}
