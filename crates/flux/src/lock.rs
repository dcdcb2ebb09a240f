//! Lock helpers
//!
//! A panicking handler must not wedge a store or dispatcher, so poisoned
//! locks are recovered with a warning instead of propagating the panic.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e: PoisonError<_>| {
        log::warn!("Recovering poisoned lock (read)");
        e.into_inner()
    })
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e: PoisonError<_>| {
        log::warn!("Recovering poisoned lock (write)");
        e.into_inner()
    })
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e: PoisonError<_>| {
        log::warn!("Recovering poisoned mutex");
        e.into_inner()
    })
}
