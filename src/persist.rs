//! Cross-reload persistence: carries the listening fd and live
//! connections across a driver teardown/init cycle.
//!
//! The C original stashes an fd in a `gpointer`-typed store using a `+1`
//! bias so that "no fd" (`NULL`) is distinguishable from "fd 0"
//! (`cfg_persist_config_add(..., GUINT_TO_POINTER(self->fd + 1), ...)`,
//! `source/http-source.c`). That trick only exists because the store is
//! untyped; replaced here with an explicit `PersistedFd` variant and a
//! small typed `PersistPoint` trait instead.

use std::any::Any;
use std::collections::HashMap;
use std::os::unix::io::RawFd;

/// A listening-socket fd as carried through the persistent store, or
/// its absence. Replaces the C "+1 bias" pointer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistedFd {
    Absent,
    Fd(RawFd),
}

impl PersistedFd {
    pub fn into_option(self) -> Option<RawFd> {
        match self {
            PersistedFd::Absent => None,
            PersistedFd::Fd(fd) => Some(fd),
        }
    }
}

impl From<Option<RawFd>> for PersistedFd {
    fn from(fd: Option<RawFd>) -> PersistedFd {
        match fd {
            Some(fd) => PersistedFd::Fd(fd),
            None => PersistedFd::Absent,
        }
    }
}

/// A keyed registry that survives a driver's deinit/init cycle. Hosts
/// embedding this crate inside a larger process may supply their own
/// implementation backed by whatever configuration-reload mechanism
/// they already have; [`InMemoryPersistStore`] is the default for a
/// standalone binary.
pub trait PersistPoint {
    fn fetch(&mut self, key: &str) -> Option<Box<dyn Any>>;
    fn store(&mut self, key: &str, value: Box<dyn Any>);
}

/// A process-local persistent store backed by a `HashMap`. Good enough
/// for a single driver instance reloading in place; a multi-process
/// host needs its own `PersistPoint`.
#[derive(Default)]
pub struct InMemoryPersistStore {
    entries: HashMap<String, Box<dyn Any>>,
}

impl InMemoryPersistStore {
    pub fn new() -> InMemoryPersistStore {
        InMemoryPersistStore { entries: HashMap::new() }
    }
}

impl PersistPoint for InMemoryPersistStore {
    fn fetch(&mut self, key: &str) -> Option<Box<dyn Any>> {
        self.entries.remove(key)
    }

    fn store(&mut self, key: &str, value: Box<dyn Any>) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Deterministic key for a listener's fd, matching `"<name>.listen_fd"`.
pub fn listen_fd_key(name: &str) -> String {
    format!("{}.listen_fd", name)
}

/// Deterministic key for a listener's live-connection list, matching
/// `"<name>.connections"`.
pub fn connections_key(name: &str) -> String {
    format!("{}.connections", name)
}
