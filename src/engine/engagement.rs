//! Activity signals computed from message metadata only.

use chrono::{DateTime, Utc};

use crate::model::{ConversationType, Engagement, MessagePrediction, NO_BUDDY_MESSAGE_DAYS};

const ACTIVITY_DAYS: i64 = 7;

/// Message counts for the last week and buddy silence.
///
/// `days_since_last_buddy_msg` looks at the whole loaded history and falls
/// back to [`NO_BUDDY_MESSAGE_DAYS`] when there is no buddy message.
pub fn engagement(messages: &[MessagePrediction], now: DateTime<Utc>) -> Engagement {
    let mut out = Engagement::default();
    let mut last_buddy: Option<DateTime<Utc>> = None;

    for message in messages {
        if (now - message.timestamp).num_days() <= ACTIVITY_DAYS {
            out.total_messages_7d += 1;
            match message.conversation_type {
                ConversationType::Buddy => out.buddy_messages_7d += 1,
                ConversationType::Counselor => out.counselor_messages_7d += 1,
                ConversationType::Group | ConversationType::Family => {}
            }
        }

        if message.conversation_type == ConversationType::Buddy {
            last_buddy = last_buddy.max(Some(message.timestamp));
        }
        out.last_message_time = out.last_message_time.max(Some(message.timestamp));
    }

    out.days_since_last_buddy_msg = last_buddy
        .map(|ts| (now - ts).num_days())
        .unwrap_or(NO_BUDDY_MESSAGE_DAYS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{at, at_hours, message};

    fn on(ts: DateTime<Utc>, kind: ConversationType) -> MessagePrediction {
        let mut m = message(ts, 0.1);
        m.conversation_type = kind;
        m
    }

    #[test]
    fn test_counts_by_conversation_type() {
        let messages = vec![
            on(at(-20), ConversationType::Buddy),
            on(at(-5), ConversationType::Buddy),
            on(at(-4), ConversationType::Counselor),
            on(at(-3), ConversationType::Group),
            on(at_hours(-2), ConversationType::Buddy),
        ];

        let e = engagement(&messages, at(0));
        assert_eq!(e.total_messages_7d, 4);
        assert_eq!(e.buddy_messages_7d, 2);
        assert_eq!(e.counselor_messages_7d, 1);
        assert_eq!(e.days_since_last_buddy_msg, 0);
        assert_eq!(e.last_message_time, Some(at_hours(-2)));
    }

    #[test]
    fn test_never_messaged_buddy_uses_sentinel() {
        let messages = vec![
            on(at(-2), ConversationType::Counselor),
            on(at(-1), ConversationType::Family),
        ];

        let e = engagement(&messages, at(0));
        assert_eq!(e.days_since_last_buddy_msg, NO_BUDDY_MESSAGE_DAYS);
        assert_eq!(e.buddy_messages_7d, 0);
        assert_eq!(e.last_message_time, Some(at(-1)));
    }

    #[test]
    fn test_old_buddy_message_still_counts_for_silence() {
        let messages = vec![
            on(at(-12), ConversationType::Buddy),
            on(at(-1), ConversationType::Counselor),
        ];

        let e = engagement(&messages, at(0));
        assert_eq!(e.days_since_last_buddy_msg, 12);
        assert_eq!(e.buddy_messages_7d, 0);
    }

    #[test]
    fn test_empty_history() {
        let e = engagement(&[], at(0));
        assert_eq!(e, Engagement::default());
        assert!(e.last_message_time.is_none());
    }
}
