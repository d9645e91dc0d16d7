use std::sync::Arc;

use super::{CompletionFn, HttpEvents, HttpTransport, ProgressFn, Strategy};
use crate::bridge::Diagnostics;
use crate::config::NormalizedConfig;
use crate::error::TransportError;
use crate::http::{HttpResponse, ProgressEvent, ResponseType};
use crate::types::{Delivery, ProgressResult, ResponseResult};

/// Runs a dispatch over an `HttpTransport`.
pub struct HttpStrategy {
    transport: Arc<dyn HttpTransport>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl HttpStrategy {
    pub fn new(transport: Arc<dyn HttpTransport>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            transport,
            diagnostics,
        }
    }
}

impl Strategy for HttpStrategy {
    fn execute(
        &self,
        config: NormalizedConfig,
        on_complete: CompletionFn,
        on_progress: Option<ProgressFn>,
    ) {
        let request = config.to_http_request();
        log::debug!(
            target: "stream",
            "sending {} {} as {:?}",
            request.method,
            request.url,
            request.response_type
        );
        let events = ResponseEvents {
            response_type: request.response_type,
            on_complete,
            on_progress,
            diagnostics: Arc::clone(&self.diagnostics),
        };
        self.transport.send(request, Box::new(events));
    }
}

struct ResponseEvents {
    response_type: ResponseType,
    on_complete: CompletionFn,
    on_progress: Option<ProgressFn>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl HttpEvents for ResponseEvents {
    fn progress(&mut self, event: ProgressEvent) {
        if let Some(on_progress) = self.on_progress.as_mut() {
            on_progress(ProgressResult::from(event));
        }
    }

    fn load(self: Box<Self>, response: HttpResponse) {
        let result = ResponseResult::from_response(response, self.response_type);
        (self.on_complete)(Delivery::Response(result));
    }

    fn error(self: Box<Self>, error: TransportError) {
        self.diagnostics.report(&format!(
            "[stream] unexpected error in http transport for \"fetch\" API: {error}"
        ));
        (self.on_complete)(Delivery::Response(ResponseResult::transport_error()));
    }
}
