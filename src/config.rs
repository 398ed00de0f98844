//! Listener configuration surface.
//!
//! A plain builder (`new()` with defaults, `done() -> Arc<Config>`)
//! carrying the options a configured HTTP source recognizes.

use std::net::IpAddr;
use std::sync::Arc;

use crate::transport::TransportKind;

#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    local_ip: Option<IpAddr>,
    local_port: Option<u16>,
    max_connections: usize,
    listen_backlog: i32,
    keep_alive_across_reloads: bool,
    transport: TransportKind,
    has_tls_context: bool,
}

impl HttpSourceConfig {
    /// Defaults matching `http_sd_init_instance`: 10 max connections,
    /// backlog 255, connections kept alive across reloads.
    pub fn new() -> HttpSourceConfig {
        HttpSourceConfig {
            local_ip: None,
            local_port: None,
            max_connections: 10,
            listen_backlog: 255,
            keep_alive_across_reloads: true,
            transport: TransportKind::Tcp,
            has_tls_context: false,
        }
    }

    pub fn local_addr(&mut self, ip: IpAddr, port: u16) -> &mut Self {
        self.local_ip = Some(ip);
        self.local_port = Some(port);
        self
    }

    pub fn max_connections(&mut self, value: usize) -> &mut Self {
        self.max_connections = value;
        self
    }

    pub fn listen_backlog(&mut self, value: i32) -> &mut Self {
        self.listen_backlog = value;
        self
    }

    pub fn keep_alive_across_reloads(&mut self, value: bool) -> &mut Self {
        self.keep_alive_across_reloads = value;
        self
    }

    pub fn transport(&mut self, kind: TransportKind) -> &mut Self {
        self.transport = kind;
        self
    }

    pub fn tls_context(&mut self, present: bool) -> &mut Self {
        self.has_tls_context = present;
        self
    }

    pub fn get_max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn get_listen_backlog(&self) -> i32 {
        self.listen_backlog
    }

    pub fn get_keep_alive_across_reloads(&self) -> bool {
        self.keep_alive_across_reloads
    }

    pub fn get_local_port(&self) -> u16 {
        self.local_port.unwrap_or_else(|| self.transport.default_port())
    }

    pub fn get_transport(&self) -> &TransportKind {
        &self.transport
    }

    /// Validate the transport/TLS-context pairing before handing the
    /// config to the driver.
    pub fn validate(&self) -> Result<(), crate::transport::TransportMapError> {
        crate::transport::validate_transport(&self.transport, self.has_tls_context)
    }

    pub fn done(&mut self) -> Arc<HttpSourceConfig> {
        Arc::new(self.clone())
    }
}

impl Default for HttpSourceConfig {
    fn default() -> HttpSourceConfig {
        HttpSourceConfig::new()
    }
}
