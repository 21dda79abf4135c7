use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("architect_chat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("architect_chat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("architect_chat.client.request_duration_seconds");

pub(crate) static STREAM_BYTES: Counter = Counter::new("architect_chat.stream.bytes");
pub(crate) static STREAM_RECORDS: Counter = Counter::new("architect_chat.stream.records");
pub(crate) static STREAM_CHUNKS: Counter = Counter::new("architect_chat.stream.chunks");
pub(crate) static STREAM_MALFORMED_RECORDS: Counter =
    Counter::new("architect_chat.stream.malformed_records");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("architect_chat.stream.errors");
pub(crate) static STREAM_DURATION: Moments =
    Moments::new("architect_chat.stream.duration_seconds");

pub(crate) static TURNS_STARTED: Counter = Counter::new("architect_chat.session.turns_started");
pub(crate) static TURNS_REJECTED: Counter = Counter::new("architect_chat.session.turns_rejected");
pub(crate) static TURNS_CANCELLED: Counter =
    Counter::new("architect_chat.session.turns_cancelled");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_RECORDS);
    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_MALFORMED_RECORDS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&TURNS_STARTED);
    collector.register_counter(&TURNS_REJECTED);
    collector.register_counter(&TURNS_CANCELLED);
}
