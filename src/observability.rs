use biometrics::{Collector, Counter, Moments};

pub(crate) static UPLOAD_REQUESTS: Counter = Counter::new("docchat.upload.requests");
pub(crate) static UPLOAD_FAILURES: Counter = Counter::new("docchat.upload.failures");
pub(crate) static UPLOAD_DURATION: Moments = Moments::new("docchat.upload.duration_seconds");

pub(crate) static CHAT_REQUESTS: Counter = Counter::new("docchat.chat.requests");
pub(crate) static CHAT_FAILURES: Counter = Counter::new("docchat.chat.failures");
pub(crate) static CHAT_REJECTED: Counter = Counter::new("docchat.chat.rejected");
pub(crate) static CHAT_DURATION: Moments = Moments::new("docchat.chat.duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&UPLOAD_REQUESTS);
    collector.register_counter(&UPLOAD_FAILURES);
    collector.register_moments(&UPLOAD_DURATION);

    collector.register_counter(&CHAT_REQUESTS);
    collector.register_counter(&CHAT_FAILURES);
    collector.register_counter(&CHAT_REJECTED);
    collector.register_moments(&CHAT_DURATION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_with_fresh_collector() {
        register_biometrics(Collector::new());
    }
}
