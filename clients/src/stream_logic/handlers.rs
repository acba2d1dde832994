use anyhow::Result;
use chrono::{DateTime, Utc};
use lib_stream::InboundEnvelope;
use serde_json::{json, Value};

fn sent_at(msg: &InboundEnvelope) -> Option<DateTime<Utc>> {
    msg.time_millis().and_then(DateTime::from_timestamp_millis)
}

/// Acknowledges every subscribed event.
pub fn on_event(msg: &InboundEnvelope) -> Result<Value> {
    log::info!(
        "EVENT topic={} id={:?} sent_at={:?} data={}",
        msg.topic(),
        msg.message_id(),
        sent_at(msg),
        msg.data
    );
    Ok(json!({"status": "SUCCESS", "message": "success"}))
}

/// Answers callback pushes (bot messages, card actions).
pub fn on_callback(msg: &InboundEnvelope) -> Result<Value> {
    log::info!("CALLBACK topic={} id={:?} data={}", msg.topic(), msg.message_id(), msg.data);
    Ok(json!({"response": {"message": "Callback processed"}}))
}
