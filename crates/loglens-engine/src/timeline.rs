use std::path::Path;

use loglens_ingest::read_events;
use loglens_types::{ConversationTurn, TimelineEvent};
use uuid::Uuid;

use crate::Result;
use crate::engine::Engine;

impl Engine {
    /// Reconstruct a session's full timeline, grouped into conversation
    /// turns.
    ///
    /// The store persists no full event set, so this is schema-on-read: the
    /// raw file goes back through decode + classify. When the file has
    /// vanished the timeline degrades to the indexed messages instead of
    /// failing.
    pub fn timeline(&self, id_or_prefix: &str) -> Result<Vec<ConversationTurn>> {
        let session_id = self.resolve_session_id(id_or_prefix)?;
        let session = self
            .get_session(&session_id)?
            .ok_or_else(|| crate::Error::SessionNotFound(session_id.clone()))?;

        let path = Path::new(&session.file_path);
        match read_events(path, &self.classifier, &session_id, None) {
            Ok(outcome) => Ok(ConversationTurn::group(outcome.events)),
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %err,
                    "timeline source unreadable, degrading to indexed messages"
                );
                Ok(ConversationTurn::group(self.events_from_messages(&session_id)?))
            }
        }
    }

    /// Lesser-but-available timeline built from the denormalized message
    /// rows, used when the raw file is gone.
    fn events_from_messages(&self, session_id: &str) -> Result<Vec<TimelineEvent>> {
        let messages = self.db().messages_for_session(session_id)?;

        Ok(messages
            .into_iter()
            .map(|message| TimelineEvent {
                id: Uuid::new_v4(),
                session_id: message.session_id,
                timestamp: None,
                actor: message.role,
                kind: match message.role {
                    loglens_types::Actor::User => loglens_types::VisibilityKind::User,
                    _ => loglens_types::VisibilityKind::Assistant,
                },
                title: None,
                text: message.text,
                attachments: Vec::new(),
                call_id: None,
                metadata: None,
                repeat_count: 1,
                position: message.position,
            })
            .collect())
    }
}
