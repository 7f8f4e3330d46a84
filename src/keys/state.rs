// Set of currently held drive keys

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::classify::{classify, Classified, DriveKey, KeyId};

/// Immutable snapshot of held drive keys (one bit per key)
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySet(u8);

impl KeySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(self, key: DriveKey) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = DriveKey> {
        DriveKey::ALL.into_iter().filter(move |k| self.contains(*k))
    }

    /// Returns true if the key was not already held
    fn insert(&mut self, key: DriveKey) -> bool {
        let added = !self.contains(key);
        self.0 |= key.bit();
        added
    }

    /// Returns true if the key was held
    fn remove(&mut self, key: DriveKey) -> bool {
        let removed = self.contains(key);
        self.0 &= !key.bit();
        removed
    }
}

impl FromIterator<DriveKey> for KeySet {
    fn from_iter<I: IntoIterator<Item = DriveKey>>(iter: I) -> Self {
        let mut set = KeySet::empty();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Held-key state shared between the keyboard listener and readers.
///
/// Every mutation and every snapshot takes the same lock, so a reader always
/// sees the set as it stood between two complete press/release calls.
#[derive(Debug, Default)]
pub struct KeyStateSet {
    held: Mutex<KeySet>,
}

impl KeyStateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down. Returns true if the held set changed.
    /// Unrecognized keys and repeats of an already held key are no-ops.
    pub fn press(&self, id: &KeyId) -> bool {
        match classify(id) {
            Classified::Recognized(key) => self.lock().insert(key),
            Classified::Ignored => false,
        }
    }

    /// Record a key-up. Returns true if the held set changed.
    pub fn release(&self, id: &KeyId) -> bool {
        match classify(id) {
            Classified::Recognized(key) => self.lock().remove(key),
            Classified::Ignored => false,
        }
    }

    pub fn snapshot(&self) -> KeySet {
        *self.lock()
    }

    // KeySet is a plain Copy value, so a poisoned lock still holds a valid set
    fn lock(&self) -> MutexGuard<'_, KeySet> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
