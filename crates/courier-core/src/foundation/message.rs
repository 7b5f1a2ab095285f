//! Incoming message events and reply addressing.
//!
//! An [`IncomingMessage`] is created by the transport for every received text
//! message and discarded once the reply (if any) has been sent. The dispatcher
//! only reads it.
//!
//! # Example
//!
//! ```rust
//! use courier_core::{IncomingMessage, ReplyTarget};
//!
//! let msg = IncomingMessage::direct("alice@example.org/phone", "!uptime");
//! assert_eq!(
//!     msg.reply_target(),
//!     ReplyTarget::Direct("alice@example.org/phone".into())
//! );
//!
//! let msg = IncomingMessage::group("lounge@conference.example.org", "Alice", "hey Bot");
//! assert_eq!(
//!     msg.reply_target(),
//!     ReplyTarget::Group("lounge@conference.example.org".into())
//! );
//! ```

use std::fmt;

/// Whether a message arrived in a one-to-one exchange or a multi-party room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationKind {
    /// A private, one-to-one conversation.
    Direct,
    /// A group chat / conference room.
    Group,
}

impl ConversationKind {
    /// Returns the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A received text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    sender: String,
    kind: ConversationKind,
    body: String,
    /// Sender nickname; only meaningful for group messages.
    display_name: Option<String>,
    /// Room identity; only present for group messages.
    room: Option<String>,
}

impl IncomingMessage {
    /// Creates a direct (one-to-one) message.
    pub fn direct(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            kind: ConversationKind::Direct,
            body: body.into(),
            display_name: None,
            room: None,
        }
    }

    /// Creates a group message posted in `room` by the occupant `display_name`.
    ///
    /// The sender identity defaults to `room/display_name`; use
    /// [`with_sender`](Self::with_sender) when the transport knows better.
    pub fn group(
        room: impl Into<String>,
        display_name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let room = room.into();
        let display_name = display_name.into();
        Self {
            sender: format!("{room}/{display_name}"),
            kind: ConversationKind::Group,
            body: body.into(),
            display_name: Some(display_name),
            room: Some(room),
        }
    }

    /// Overrides the sender identity.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Sets the sender display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// The sender identity as delivered by the transport.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The conversation kind.
    pub fn kind(&self) -> ConversationKind {
        self.kind
    }

    /// The raw message text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The sender nickname, if known.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The room identity for group messages.
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Returns `true` for group messages.
    pub fn is_group(&self) -> bool {
        self.kind == ConversationKind::Group
    }

    /// Where a reply to this message should go.
    ///
    /// Direct messages are answered privately to the sender, group messages
    /// are answered in the room they came from.
    pub fn reply_target(&self) -> ReplyTarget {
        match (self.kind, &self.room) {
            (ConversationKind::Group, Some(room)) => ReplyTarget::Group(room.clone()),
            (ConversationKind::Group, None) => {
                ReplyTarget::Group(bare_identity(&self.sender).to_string())
            }
            (ConversationKind::Direct, _) => ReplyTarget::Direct(self.sender.clone()),
        }
    }
}

/// The conversation a reply is sent into.
///
/// The transport owns addressing: it turns these identities into whatever
/// full conversation identifiers its protocol needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReplyTarget {
    /// A private reply to this identity.
    Direct(String),
    /// A reply posted into this room.
    Group(String),
}

impl ReplyTarget {
    /// The addressed identity.
    pub fn address(&self) -> &str {
        match self {
            Self::Direct(id) | Self::Group(id) => id,
        }
    }

    /// The conversation kind of this target.
    pub fn kind(&self) -> ConversationKind {
        match self {
            Self::Direct(_) => ConversationKind::Direct,
            Self::Group(_) => ConversationKind::Group,
        }
    }
}

impl fmt::Display for ReplyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.address())
    }
}

/// Strips a trailing `/resource` from an identity.
///
/// Two sessions of the same account share a bare identity, so comparing bare
/// forms catches echoes of the bot's own messages.
pub fn bare_identity(identity: &str) -> &str {
    identity
        .split_once('/')
        .map_or(identity, |(bare, _resource)| bare)
}
