use std::time::Duration;

use nlink_utils::ThreadPriority;
use serde::Serialize;

/// Connection and subscriber configuration.
///
/// `host`/`port` and the mailbox capacities/thread-affinity knobs drive
/// this core's own dialing and thread setup and are never serialized; the
/// remaining fields become the CONNECT JSON payload (§4.F). TLS and
/// auth-token fields are opaque passthrough: this core performs no TLS
/// handshake or token acquisition of its own.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectOpts {
    #[serde(skip)]
    pub(crate) host: String,
    #[serde(skip)]
    pub(crate) port: u16,
    #[serde(skip)]
    pub(crate) connect_timeout: Duration,
    #[serde(skip)]
    pub(crate) free_pool_capacity: usize,
    #[serde(skip)]
    pub(crate) delivery_capacity: usize,
    #[serde(skip)]
    pub(crate) reader_core: Option<usize>,
    #[serde(skip)]
    pub(crate) reader_priority: ThreadPriority,

    verbose: bool,
    pedantic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    lang: &'static str,
    version: &'static str,
    protocol: u8,
    tls_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pass: Option<String>,
}

impl ConnectOpts {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, ..Self::default() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_free_pool_capacity(mut self, capacity: usize) -> Self {
        self.free_pool_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_delivery_capacity(mut self, capacity: usize) -> Self {
        self.delivery_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_reader_affinity(mut self, core: usize, priority: ThreadPriority) -> Self {
        self.reader_core = Some(core);
        self.reader_priority = priority;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_pedantic(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_tls_required(mut self, tls_required: bool) -> Self {
        self.tls_required = tls_required;
        self
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_user_pass(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.pass = Some(pass.into());
        self
    }
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4222,
            connect_timeout: Duration::from_secs(5),
            free_pool_capacity: 64,
            delivery_capacity: 1024,
            reader_core: None,
            reader_priority: ThreadPriority::OSDefault,
            verbose: false,
            pedantic: false,
            name: None,
            lang: "rust",
            version: env!("CARGO_PKG_VERSION"),
            protocol: 1,
            tls_required: false,
            auth_token: None,
            user: None,
            pass: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_json_is_single_line_and_round_trips_fields() {
        let opts = ConnectOpts::new("nats.example.com", 4222)
            .with_verbose(true)
            .with_pedantic(true)
            .with_name("test-client");

        let json = serde_json::to_string(&opts).unwrap();
        assert!(!json.contains('\n'));
        assert!(!json.contains('\r'));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["verbose"], serde_json::json!(true));
        assert_eq!(value["pedantic"], serde_json::json!(true));
        assert_eq!(value["name"], serde_json::json!("test-client"));
        assert_eq!(value["lang"], serde_json::json!("rust"));
        assert!(value.get("host").is_none(), "dial target must not leak into CONNECT JSON");
    }

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let opts = ConnectOpts::new("127.0.0.1", 4222);
        let json = serde_json::to_string(&opts).unwrap();
        assert!(!json.contains("auth_token"));
        assert!(!json.contains("\"user\""));
        assert!(!json.contains("\"name\""));
    }
}
