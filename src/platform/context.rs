//! Process-wide network context
//!
//! Explicit init-once / teardown-once lifecycle for the network stack.
//! std performs any OS-level setup lazily, so the guard only tracks users
//! and logs the transitions, but applications hold it for the whole time
//! they use sockets.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;

static USERS: AtomicUsize = AtomicUsize::new(0);

/// Guard keeping the network stack initialised.
///
/// The first guard initialises, the last one dropped tears down. Extra
/// `startup` calls are cheap and idempotent.
#[derive(Debug)]
#[must_use = "the network stack is torn down when the guard is dropped"]
pub struct NetworkContext {
    _private: (),
}

impl NetworkContext {
    pub fn startup() -> Result<Self> {
        if USERS.fetch_add(1, Ordering::AcqRel) == 0 {
            log::debug!("network stack initialised");
        }
        Ok(Self { _private: () })
    }

    /// Whether at least one guard is alive
    pub fn is_active() -> bool {
        USERS.load(Ordering::Acquire) > 0
    }
}

impl Drop for NetworkContext {
    fn drop(&mut self) {
        if USERS.fetch_sub(1, Ordering::AcqRel) == 1 {
            log::debug!("network stack released");
        }
    }
}
