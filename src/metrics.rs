use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::Result;

/// Process-wide request accounting.
///
/// Built once at startup and handed to the HTTP layer; it lives until the
/// process exits.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
}

impl Metrics {
    pub fn new(version: &str) -> Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "The total number of HTTP requests."),
            &["code", "handler", "method"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let build_info = IntGaugeVec::new(
            Opts::new("servoman_build_info", "Build information about servoman."),
            &["version"],
        )?;
        build_info.with_label_values(&[version]).set(1);
        registry.register(Box::new(build_info))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            requests_total,
        })
    }

    pub fn observe(&self, code: u16, handler: &str, method: &str) {
        self.counter(code, handler, method).inc();
    }

    /// Current count for one label set.
    pub fn requests(&self, code: u16, handler: &str, method: &str) -> u64 {
        self.counter(code, handler, method).get()
    }

    fn counter(&self, code: u16, handler: &str, method: &str) -> IntCounter {
        let code = code.to_string();
        let method = method.to_lowercase();
        self.requests_total
            .with_label_values(&[code.as_str(), handler, method.as_str()])
    }

    /// Text exposition of everything registered.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
