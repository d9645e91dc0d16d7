//! The request dispatcher.
//!
//! # Design
//! `RequestDispatcher` owns one instance of each strategy plus the injected
//! host bridge and diagnostics sink. A dispatch normalizes the options, picks
//! the strategy once from the normalized config and hands it sinks that
//! forward to `HostBridge::deliver`. Nothing is shared between dispatches
//! besides those immutable collaborators.
//!
//! Validation failures are reported to diagnostics and returned as `Err`; the
//! completion identifier is never delivered to in that case.

use std::sync::Arc;

use crate::bridge::{Diagnostics, HostBridge, LogDiagnostics};
use crate::config::{normalize, StrategyKind};
use crate::error::DispatchError;
use crate::options::RequestOptions;
use crate::transport::{
    HttpStrategy, HttpTransport, ProgressFn, ScriptInjectionStrategy, ScriptTransport, Strategy,
    UreqConfig, UreqHttpTransport, UreqScriptTransport,
};
use crate::types::{CallbackId, Delivery, ProgressResult};

/// Validates request options and runs them on the matching transport.
pub struct RequestDispatcher {
    http: HttpStrategy,
    script: ScriptInjectionStrategy,
    bridge: Arc<dyn HostBridge>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl RequestDispatcher {
    /// Build a dispatcher reporting diagnostics through `log`.
    pub fn new(
        http: Arc<dyn HttpTransport>,
        script: Arc<dyn ScriptTransport>,
        bridge: Arc<dyn HostBridge>,
    ) -> Self {
        Self::with_diagnostics(http, script, bridge, Arc::new(LogDiagnostics))
    }

    pub fn with_diagnostics(
        http: Arc<dyn HttpTransport>,
        script: Arc<dyn ScriptTransport>,
        bridge: Arc<dyn HostBridge>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            http: HttpStrategy::new(http, Arc::clone(&diagnostics)),
            script: ScriptInjectionStrategy::new(script, Arc::clone(&diagnostics)),
            bridge,
            diagnostics,
        }
    }

    /// Dispatcher over the bundled `ureq` primitives.
    pub fn with_ureq(config: &UreqConfig, bridge: Arc<dyn HostBridge>) -> Self {
        Self::new(
            Arc::new(UreqHttpTransport::new(config)),
            Arc::new(UreqScriptTransport::new(config)),
            bridge,
        )
    }

    /// Validate `options` and start the request.
    ///
    /// Returns once the transport has been handed the request. The result
    /// arrives later as a single delivery to `completion`, preceded by any
    /// number of progress deliveries to `progress` when one is given.
    pub fn fetch(
        &self,
        options: &RequestOptions,
        completion: CallbackId,
        progress: Option<CallbackId>,
    ) -> Result<(), DispatchError> {
        let config =
            normalize(options).inspect_err(|err| self.diagnostics.report(&err.to_string()))?;

        let bridge = Arc::clone(&self.bridge);
        let on_complete = Box::new(move |result: Delivery| bridge.deliver(&completion, result, false));

        let on_progress = progress.map(|id| {
            let bridge = Arc::clone(&self.bridge);
            Box::new(move |result: ProgressResult| {
                bridge.deliver(&id, Delivery::Progress(result), true)
            }) as ProgressFn
        });

        let strategy: &dyn Strategy = match config.strategy() {
            StrategyKind::Http => &self.http,
            StrategyKind::ScriptInjection => &self.script,
        };
        strategy.execute(config, on_complete, on_progress);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::HttpRequest;
    use crate::transport::{HttpEvents, ScriptCallback};

    struct NeverHttp;

    impl HttpTransport for NeverHttp {
        fn send(&self, _request: HttpRequest, _events: Box<dyn HttpEvents>) {
            panic!("http transport must not be called");
        }
    }

    struct NeverScript;

    impl ScriptTransport for NeverScript {
        fn fetch(&self, _url: &str, _done: ScriptCallback) {
            panic!("script transport must not be called");
        }
    }

    #[derive(Default)]
    struct Reports(Mutex<Vec<String>>);

    impl Diagnostics for Reports {
        fn report(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn validation_failure_reports_and_skips_transport() {
        let reports = Arc::new(Reports::default());
        let dispatcher = RequestDispatcher::with_diagnostics(
            Arc::new(NeverHttp),
            Arc::new(NeverScript),
            Arc::new(|_: &CallbackId, _: Delivery, _: bool| panic!("nothing must be delivered")),
            reports.clone(),
        );

        let err = dispatcher
            .fetch(
                &RequestOptions::new("http://x").method("TRACE"),
                CallbackId::new("cb-1"),
                None,
            )
            .unwrap_err();

        assert_eq!(err, DispatchError::InvalidMethod("TRACE".to_string()));
        assert_eq!(*reports.0.lock().unwrap(), vec![err.to_string()]);
    }
}
