//! Poison-recovering mutex access shared by the session, the controller and the scripted backend.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `m`, taking the guard back if a panic poisoned it.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
