use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("champlain_guide.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("champlain_guide.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("champlain_guide.client.request_duration_seconds");

pub(crate) static COMPLETION_EMPTY: Counter = Counter::new("champlain_guide.completion.empty");
pub(crate) static COMPLETION_FAILED: Counter = Counter::new("champlain_guide.completion.failed");

pub(crate) static CONVERSATION_SUBMITS: Counter =
    Counter::new("champlain_guide.conversation.submits");
pub(crate) static CONVERSATION_REJECTED: Counter =
    Counter::new("champlain_guide.conversation.rejected");
pub(crate) static CONVERSATION_STALE: Counter =
    Counter::new("champlain_guide.conversation.stale_replies");
pub(crate) static CONVERSATION_CLEARS: Counter =
    Counter::new("champlain_guide.conversation.clears");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&COMPLETION_EMPTY);
    collector.register_counter(&COMPLETION_FAILED);

    collector.register_counter(&CONVERSATION_SUBMITS);
    collector.register_counter(&CONVERSATION_REJECTED);
    collector.register_counter(&CONVERSATION_STALE);
    collector.register_counter(&CONVERSATION_CLEARS);
}
