use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Key of a live preview handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

/// Owned reference to bytes registered in a [`HandleRegistry`].
///
/// Not `Clone`: exactly one owner exists, and revoking consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle(HandleId);

impl PreviewHandle {
    pub fn id(&self) -> HandleId {
        self.0
    }
}

/// Counters describing the registry, for leak checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub bound: u64,
    pub revoked: u64,
    pub live: usize,
}

/// Table of transient, revocable references to displayable bytes.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    next: u64,
    live: HashMap<HandleId, Arc<[u8]>>,
    bound: u64,
    revoked: u64,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, bytes: Arc<[u8]>) -> PreviewHandle {
        self.next += 1;
        let id = HandleId(self.next);
        self.live.insert(id, bytes);
        self.bound += 1;
        PreviewHandle(id)
    }

    /// Release the bytes behind `handle`. Returns `false` if it was not live.
    pub fn revoke(&mut self, handle: PreviewHandle) -> bool {
        let released = self.live.remove(&handle.0).is_some();
        if released {
            self.revoked += 1;
        }
        released
    }

    pub fn resolve(&self, id: HandleId) -> Option<Arc<[u8]>> {
        self.live.get(&id).cloned()
    }

    pub fn stats(&self) -> HandleStats {
        HandleStats {
            bound: self.bound,
            revoked: self.revoked,
            live: self.live.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoke_releases_bytes_once() {
        let mut registry = HandleRegistry::new();
        let handle = registry.bind(Arc::from(vec![1u8, 2, 3]));
        let id = handle.id();
        assert_eq!(registry.resolve(id).as_deref(), Some(&[1u8, 2, 3][..]));

        assert!(registry.revoke(handle));
        assert!(registry.resolve(id).is_none());
        assert_eq!(
            registry.stats(),
            HandleStats {
                bound: 1,
                revoked: 1,
                live: 0
            }
        );
    }

    #[test]
    fn handles_are_unique() {
        let mut registry = HandleRegistry::new();
        let a = registry.bind(Arc::from(vec![0u8]));
        let b = registry.bind(Arc::from(vec![0u8]));
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.stats().live, 2);
    }
}
