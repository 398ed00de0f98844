//! Connection/listener driver: accept-loop bookkeeping, the connection
//! cap, input-window distribution, and cross-reload persistence
//! handoff.
//!
//! Grounded on `lib/http/source/http-source.c`'s `HTTPSourceDriver`:
//! `http_sd_accept`/`http_sd_process_connection` (accept batching and
//! the `max_connections` cap), `http_sd_setup_reader_options` (window
//! sizing), and `http_sd_save_listener`/`http_sd_save_connections`/
//! `http_sd_restore_kept_alive_connections` (persistence across a
//! reload). The actual socket `accept()`/event-loop registration is a
//! host concern (transport and event loop are out of scope here); this
//! module owns the decisions the host's loop should act on.

use std::collections::HashSet;
use std::os::unix::io::RawFd;
use std::sync::Arc;

use crate::config::HttpSourceConfig;
use crate::persist::{connections_key, listen_fd_key, PersistPoint, PersistedFd};

/// Accepts are drained in batches so one listener can't starve the
/// rest of the host's event loop on a connection storm.
const MAX_ACCEPTS_AT_A_TIME: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted,
    RejectedAtCapacity,
}

/// Tracks live connection fds and enforces `max_connections`, mirroring
/// `HTTPSourceDriver.connections`/`num_connections`.
pub struct ListenerDriver {
    config: Arc<HttpSourceConfig>,
    live: HashSet<RawFd>,
    window_size_initialized: bool,
    computed_window: Option<usize>,
}

impl ListenerDriver {
    pub fn new(config: Arc<HttpSourceConfig>) -> ListenerDriver {
        ListenerDriver {
            config,
            live: HashSet::new(),
            window_size_initialized: false,
            computed_window: None,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.live.len()
    }

    /// Offer up to [`MAX_ACCEPTS_AT_A_TIME`] pending connections from
    /// `incoming`, returning one decision per fd actually looked at.
    /// `incoming` should stop yielding once the host's `accept()` would
    /// block; this only caps how many it will process in one call.
    pub fn accept_batch(
        &mut self,
        incoming: impl Iterator<Item = RawFd>,
    ) -> Vec<(RawFd, AcceptOutcome)> {
        incoming
            .take(MAX_ACCEPTS_AT_A_TIME)
            .map(|fd| (fd, self.process_connection(fd)))
            .collect()
    }

    fn process_connection(&mut self, fd: RawFd) -> AcceptOutcome {
        if self.live.len() >= self.config.get_max_connections() {
            error!(
                "number of allowed concurrent connections reached, rejecting connection; fd={} max={}",
                fd,
                self.config.get_max_connections()
            );
            AcceptOutcome::RejectedAtCapacity
        } else {
            self.live.insert(fd);
            info!("connection accepted; fd={}", fd);
            AcceptOutcome::Accepted
        }
    }

    /// Record a connection as gone, mirroring `http_sd_close_connection`.
    pub fn close_connection(&mut self, fd: RawFd) {
        if self.live.remove(&fd) {
            info!("connection closed; fd={}", fd);
        }
    }

    /// Divide `configured_window` evenly across the connection cap,
    /// clamping up to `min_iw_size_per_reader` (and warning once) if
    /// the split leaves too little room per connection. Computed once
    /// and cached; every call after the first returns the cached value
    /// regardless of the arguments passed, matching
    /// `window_size_initialized`.
    pub fn distribute_window(&mut self, configured_window: usize, min_iw_size_per_reader: usize) -> usize {
        if let Some(window) = self.computed_window {
            return window;
        }
        self.window_size_initialized = true;

        let max_connections = self.config.get_max_connections().max(1);
        let divided = configured_window / max_connections;
        let window = if divided < min_iw_size_per_reader {
            warn!(
                "window sizing for tcp sources divided by max-connections() produced too small a value, \
                 clamping to min_iw_size_per_reader; orig_log_iw_size={} new_log_iw_size={} min_iw_size_per_reader={}",
                divided,
                min_iw_size_per_reader,
                min_iw_size_per_reader
            );
            min_iw_size_per_reader
        } else {
            divided
        };
        self.computed_window = Some(window);
        window
    }

    /// Hand the listening fd and live-connection set to `persist` for
    /// the duration of a config reload, matching
    /// `http_sd_save_listener`/`http_sd_save_connections`. When
    /// `keep_alive_across_reloads` is false the caller is expected to
    /// close `listen_fd` and every live fd itself; nothing is stored.
    pub fn teardown(&mut self, persist: &mut dyn PersistPoint, name: &str, listen_fd: Option<RawFd>) {
        if !self.config.get_keep_alive_across_reloads() {
            self.live.clear();
            return;
        }
        persist.store(&listen_fd_key(name), Box::new(PersistedFd::from(listen_fd)));
        let connections: Vec<RawFd> = self.live.drain().collect();
        persist.store(&connections_key(name), Box::new(connections));
    }

    /// Fetch a previously torn-down listener fd and live-connection set
    /// back out of `persist`, matching
    /// `http_sd_restore_kept_alive_connections`. Connections restored
    /// this way are assumed already initialized by the host (the state
    /// machine and transport for each survives the reload); this just
    /// re-seeds the cap bookkeeping.
    pub fn restore(&mut self, persist: &mut dyn PersistPoint, name: &str) -> PersistedFd {
        let listen_fd = persist
            .fetch(&listen_fd_key(name))
            .and_then(|b| b.downcast::<PersistedFd>().ok())
            .map(|b| *b)
            .unwrap_or(PersistedFd::Absent);

        if let Some(connections) = persist
            .fetch(&connections_key(name))
            .and_then(|b| b.downcast::<Vec<RawFd>>().ok())
        {
            self.live.extend(*connections);
        }

        listen_fd
    }
}
