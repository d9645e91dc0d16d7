use std::sync::Arc;

use super::{CompletionFn, ProgressFn, ScriptTransport, Strategy};
use crate::bridge::Diagnostics;
use crate::config::NormalizedConfig;
use crate::types::Delivery;

/// Runs a dispatch over a `ScriptTransport`.
///
/// Only the url is used. Method, mode, headers, body and timeout are ignored
/// and no progress is ever reported.
pub struct ScriptInjectionStrategy {
    transport: Arc<dyn ScriptTransport>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl ScriptInjectionStrategy {
    pub fn new(transport: Arc<dyn ScriptTransport>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            transport,
            diagnostics,
        }
    }
}

impl Strategy for ScriptInjectionStrategy {
    fn execute(
        &self,
        config: NormalizedConfig,
        on_complete: CompletionFn,
        _on_progress: Option<ProgressFn>,
    ) {
        // Reported but not fatal: the primitive still gets the call.
        if config.url.is_empty() {
            self.diagnostics
                .report("[stream] config.url should be set for script-injection \"fetch\" API.");
        }
        log::debug!(target: "stream", "injecting script for {}", config.url);
        self.transport.fetch(
            &config.url,
            Box::new(move |outcome| on_complete(Delivery::from(outcome))),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::config::normalize;
    use crate::error::TransportError;
    use crate::options::RequestOptions;
    use crate::transport::ScriptCallback;

    struct FixedScript {
        urls: Mutex<Vec<String>>,
        outcome: Result<Value, TransportError>,
    }

    impl ScriptTransport for FixedScript {
        fn fetch(&self, url: &str, done: ScriptCallback) {
            self.urls.lock().unwrap().push(url.to_string());
            done(self.outcome.clone());
        }
    }

    #[derive(Default)]
    struct Reports(Mutex<Vec<String>>);

    impl Diagnostics for Reports {
        fn report(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn run(
        config: NormalizedConfig,
        outcome: Result<Value, TransportError>,
    ) -> (Vec<String>, Vec<Delivery>, Vec<String>) {
        let transport = Arc::new(FixedScript {
            urls: Mutex::new(Vec::new()),
            outcome,
        });
        let reports = Arc::new(Reports::default());
        let strategy = ScriptInjectionStrategy::new(transport.clone(), reports.clone());
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&deliveries);
        strategy.execute(
            config,
            Box::new(move |d| sink.lock().unwrap().push(d)),
            Some(Box::new(|_| panic!("script injection never reports progress"))),
        );
        let urls = transport.urls.lock().unwrap().clone();
        let deliveries = deliveries.lock().unwrap().clone();
        let reports = reports.0.lock().unwrap().clone();
        (urls, deliveries, reports)
    }

    #[test]
    fn delivers_payload_once() {
        let config = normalize(
            &RequestOptions::new("http://x/data")
                .response_type("jsonp")
                .method("post")
                .body(json!({"ignored": true})),
        )
        .unwrap();
        let (urls, deliveries, reports) = run(config, Ok(json!({"a": 1})));
        assert_eq!(urls, vec!["http://x/data".to_string()]);
        assert_eq!(deliveries, vec![Delivery::Script(json!({"a": 1}))]);
        assert!(reports.is_empty());
    }

    #[test]
    fn missing_url_is_reported_but_still_attempted() {
        let mut config = normalize(&RequestOptions::new("http://x").response_type("jsonp")).unwrap();
        config.url.clear();
        let (urls, deliveries, reports) = run(config, Ok(Value::Null));
        assert_eq!(urls, vec![String::new()]);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn primitive_error_passes_through() {
        let config = normalize(&RequestOptions::new("http://x").response_type("jsonp")).unwrap();
        let (_, deliveries, _) = run(config, Err(TransportError::Timeout));
        assert_eq!(
            deliveries,
            vec![Delivery::ScriptError("request timed out".to_string())]
        );
    }
}
