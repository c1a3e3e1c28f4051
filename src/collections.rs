//! Id-keyed collections that switch between gxhash and std hashing based on
//! the `gxhash` feature. Building without the feature keeps the crate usable
//! on targets that lack the AES/SSE2 intrinsics gxhash needs.

#[cfg(feature = "gxhash")]
use gxhash::{HashMap as HashMapImpl, HashMapExt as _, HashSet as HashSetImpl, HashSetExt as _};

#[cfg(not(feature = "gxhash"))]
use std::collections::{HashMap as HashMapImpl, HashSet as HashSetImpl};

/// Map keyed by menu id
pub type IdMap<V> = HashMapImpl<String, V>;

/// Set of menu ids
pub type IdSet = HashSetImpl<String>;

/// Create an empty [`IdMap`] sized for `capacity` entries
pub fn id_map_with_capacity<V>(capacity: usize) -> IdMap<V> {
    IdMap::with_capacity(capacity)
}

/// Create an empty [`IdSet`] sized for `capacity` entries
pub fn id_set_with_capacity(capacity: usize) -> IdSet {
    IdSet::with_capacity(capacity)
}

/// Collect borrowed ids into an owned [`IdSet`]
pub fn id_set_from<'a, I>(ids: I) -> IdSet
where
    I: IntoIterator<Item = &'a str>,
{
    let iter = ids.into_iter();
    let mut set = id_set_with_capacity(iter.size_hint().0);
    for id in iter {
        set.insert(id.to_string());
    }
    set
}
