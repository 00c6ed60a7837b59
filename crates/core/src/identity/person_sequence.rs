use std::sync::{Mutex, PoisonError};

/// Run-wide issuer of global person numbers.
///
/// Constructed once per run and shared by every video worker through an
/// `Arc`. Numbers start at 1 and each call returns exactly one more than the
/// previous call, regardless of which thread made it. The lock covers only
/// the read-increment-write; callers must not hold anything else while
/// calling, and the sequence never calls out.
#[derive(Debug, Default)]
pub struct PersonSequence {
    last: Mutex<u64>,
}

impl PersonSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next global person number.
    pub fn increment(&self) -> u64 {
        // A panic elsewhere cannot leave a bare integer half-updated.
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        *last += 1;
        *last
    }

    /// How many numbers have been issued so far.
    pub fn issued(&self) -> u64 {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
