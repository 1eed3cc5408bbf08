//! Memoize: cache results per derived key.
//!
//! The cache has no eviction and no size limit; entries live as long as the
//! wrapper. Presence is decided by key, so results such as `0`, `""` or
//! `None` are cached like any other value.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A memoized function keyed by `K`.
///
/// Clones share one cache.
pub struct Memoize<A, K, R> {
    inner: Arc<MemoizeInner<A, K, R>>,
}

struct MemoizeInner<A, K, R> {
    func: Box<dyn Fn(A) -> R + Send + Sync>,
    key_fn: Box<dyn Fn(&A) -> K + Send + Sync>,
    cache: Mutex<HashMap<K, R>>,
}

/// Memoize `func`, keying the cache by the argument value itself.
///
/// ```
/// use function_helpers::memoize::memoize;
///
/// let double = memoize(|x: i64| x * 2);
/// assert_eq!(double.call(3), 6);
/// assert_eq!(double.call(3), 6);
/// assert_eq!(double.len(), 1);
/// ```
pub fn memoize<A, R, F>(func: F) -> Memoize<A, A, R>
where
    A: Clone + Eq + Hash + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    memoize_with(func, |args: &A| args.clone())
}

/// Memoize `func`, deriving cache keys with `key_fn`.
///
/// Multi-argument functions take a tuple; keying on its first element
/// reproduces a "first argument" key:
///
/// ```
/// use function_helpers::memoize::memoize_with;
///
/// let lookup = memoize_with(
///     |(id, label): (u32, &'static str)| format!("{id}:{label}"),
///     |(id, _): &(u32, &'static str)| *id,
/// );
/// assert_eq!(lookup.call((1, "a")), "1:a");
/// assert_eq!(lookup.call((1, "b")), "1:a");
/// ```
pub fn memoize_with<A, K, R, F, KF>(func: F, key_fn: KF) -> Memoize<A, K, R>
where
    K: Eq + Hash,
    F: Fn(A) -> R + Send + Sync + 'static,
    KF: Fn(&A) -> K + Send + Sync + 'static,
{
    Memoize {
        inner: Arc::new(MemoizeInner {
            func: Box::new(func),
            key_fn: Box::new(key_fn),
            cache: Mutex::new(HashMap::new()),
        }),
    }
}

impl<A, K, R> Memoize<A, K, R>
where
    K: Eq + Hash,
    R: Clone,
{
    /// Return the cached result for this call's key, computing it on a miss.
    ///
    /// The body runs without the cache lock held. If two computations for
    /// the same key overlap, the first stored value wins and both callers
    /// receive it.
    pub fn call(&self, args: A) -> R {
        let key = (self.inner.key_fn)(&args);

        let cached = self.inner.lock_cache().get(&key).cloned();
        if let Some(hit) = cached {
            tracing::trace!("Memoize cache hit");
            return hit;
        }

        tracing::trace!("Memoize cache miss");
        let computed = (self.inner.func)(args);
        self.inner
            .lock_cache()
            .entry(key)
            .or_insert(computed)
            .clone()
    }

    /// The cached result for `key`, without computing anything.
    pub fn get(&self, key: &K) -> Option<R> {
        self.inner.lock_cache().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock_cache().contains_key(key)
    }
}

impl<A, K, R> Memoize<A, K, R> {
    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.inner.lock_cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A, K, R> MemoizeInner<A, K, R> {
    fn lock_cache(&self) -> MutexGuard<'_, HashMap<K, R>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A, K, R> Clone for Memoize<A, K, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, K, R> fmt::Debug for Memoize<A, K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoize")
            .field("entries", &self.len())
            .finish()
    }
}
