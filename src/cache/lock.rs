use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

// A poisoned lock means another reader or writer panicked mid-operation.
// The store only holds replaceable snapshots of upstream data, so the
// inner value stays usable and the next refresh overwrites it anyway.

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    store: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                store,
                op,
                access = "read",
                "Cache lock poisoned by an earlier panic, reading through it"
            );
            poisoned.into_inner()
        }
    }
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    store: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                store,
                op,
                access = "write",
                "Cache lock poisoned by an earlier panic, writing through it"
            );
            poisoned.into_inner()
        }
    }
}
