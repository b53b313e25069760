//! Session and recency aggregation over the chat message log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{EngagementMetrics, MessageStamp};

/// Session windows are `(min, max)` per session id over all message stamps.
/// A single-message session gets a 0.1-minute floor so it does not register
/// as zero engagement.
pub fn compute(messages: &[MessageStamp], now: DateTime<Utc>) -> EngagementMetrics {
    if messages.is_empty() {
        // Default carries the 365-day recency sentinel
        return EngagementMetrics::default();
    }

    let mut sessions: HashMap<&str, (DateTime<Utc>, DateTime<Utc>)> = HashMap::new();
    for message in messages {
        sessions
            .entry(message.session_id.as_str())
            .and_modify(|(start, end)| {
                if message.timestamp < *start {
                    *start = message.timestamp;
                }
                if message.timestamp > *end {
                    *end = message.timestamp;
                }
            })
            .or_insert((message.timestamp, message.timestamp));
    }

    let durations: Vec<f64> = sessions
        .values()
        .map(|(start, end)| ((*end - *start).num_seconds() as f64 / 60.0).max(0.1))
        .collect();

    let session_count = sessions.len() as u32;
    let total_engagement_minutes: f64 = durations.iter().sum();
    let avg_session_duration_minutes = total_engagement_minutes / durations.len() as f64;

    let last_message = messages.iter().map(|m| m.timestamp).max().unwrap_or(now);
    let earliest_message = messages.iter().map(|m| m.timestamp).min().unwrap_or(now);

    let days_since_last_session = (now - last_message).num_days();
    let weeks_span = (now - earliest_message).num_days() as f64 / 7.0;
    let conversation_frequency = messages.len() as f64 / weeks_span.max(1.0);
    let response_rate = (conversation_frequency / 7.0).min(1.0);

    EngagementMetrics {
        session_count,
        avg_session_duration_minutes,
        total_engagement_minutes,
        days_since_last_session,
        conversation_frequency,
        response_rate,
    }
}
