//! Declarative assembly of storage topologies.
//!
//! Every helper here returns a concrete combinator type, so an assembled
//! tree keeps each leaf's type visible. Nothing is boxed unless the caller
//! chooses to box it.
//!
//! ```
//! use zenea_store::{branch, MemoryBlockStorage, Topology};
//!
//! let local = MemoryBlockStorage::new();
//! let remote = MemoryBlockStorage::new();
//! let use_cache = true;
//!
//! // cache<memory, memory> or plain "memory, memory", picked once here.
//! let storage = Topology::new(local).then(remote).cached_if(use_cache).build();
//! assert_eq!(storage.to_string(), "cache<memory, memory>");
//!
//! let picked = branch(false, MemoryBlockStorage::new, || "unused");
//! assert!(!picked.is_first());
//! ```

use crate::cache::BlockCache;
use crate::either::StorageEither;
use crate::list::StorageList;
use crate::pair::StoragePair;

/// A topology under construction, rooted at `S`.
#[derive(Debug)]
pub struct Topology<S> {
    root: S,
}

impl<S> Topology<S> {
    pub fn new(root: S) -> Self {
        Self { root }
    }

    /// Consult the current topology first and `next` after it; puts reach both.
    pub fn then<N>(self, next: N) -> Topology<StoragePair<S, N>> {
        Topology::new(StoragePair::new(Some(self.root), next))
    }

    /// Wrap the current topology in a [`BlockCache`].
    pub fn cached(self) -> Topology<BlockCache<S>>
    where
        S: crate::BlockStorage,
    {
        Topology::new(BlockCache::new(self.root))
    }

    /// Wrap the current topology in a [`BlockCache`] only if `enabled`.
    pub fn cached_if(self, enabled: bool) -> Topology<StorageEither<BlockCache<S>, S>>
    where
        S: crate::BlockStorage,
    {
        let root = self.root;
        Topology::new(if enabled {
            StorageEither::First(BlockCache::new(root))
        } else {
            StorageEither::Second(root)
        })
    }

    /// Apply an arbitrary wrapping step.
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> Topology<T> {
        Topology::new(f(self.root))
    }

    pub fn build(self) -> S {
        self.root
    }
}

/// Choose one of two storages once, keeping both types visible.
///
/// Only the selected constructor runs.
pub fn branch<T, F>(
    condition: bool,
    if_true: impl FnOnce() -> T,
    if_false: impl FnOnce() -> F,
) -> StorageEither<T, F> {
    if condition {
        StorageEither::First(if_true())
    } else {
        StorageEither::Second(if_false())
    }
}

/// Any number of same-typed storages consulted in order.
pub fn sequence<S>(sources: impl IntoIterator<Item = S>) -> StorageList<S> {
    sources.into_iter().collect()
}

/// An optional storage consulted before `second`.
pub fn fallback<A, B>(first: Option<A>, second: B) -> StoragePair<A, B> {
    StoragePair::new(first, second)
}

/// Chain storages of possibly different types into nested [`StoragePair`]s.
///
/// `chain!(a, b, c)` reads `a`, then `b`, then `c`, and expands to
/// `StoragePair::new(Some(a), StoragePair::new(Some(b), c))`.
///
/// [`StoragePair`]: crate::StoragePair
#[macro_export]
macro_rules! chain {
    ($last:expr $(,)?) => {
        $last
    };
    ($head:expr, $($rest:expr),+ $(,)?) => {
        $crate::StoragePair::new(::core::option::Option::Some($head), $crate::chain!($($rest),+))
    };
}
