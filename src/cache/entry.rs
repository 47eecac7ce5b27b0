//! A lazily computed value that recomputes itself once it expires
//!
//! The factory returns both the value and its expiration time, so each
//! computation decides how long its own result stays fresh. Results are
//! memoized whether they are values or errors.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// A boxed, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What a factory produces: the expiration time and the outcome
pub type Computed<T, E> = (DateTime<Utc>, Result<T, E>);

type Factory<T, E> = Arc<dyn Fn() -> BoxFuture<Computed<T, E>> + Send + Sync>;

struct Slot<T, E> {
    value: Option<Result<T, E>>,
    expires_at: DateTime<Utc>,
}

/// A memoized, self-refreshing value
///
/// Reads of a fresh value only take a read lock. When the value is missing
/// or expired, one caller runs the factory while the others wait for it and
/// then share its result.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use robotgate::ExpiringEntry;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let entry = ExpiringEntry::new(|| async {
///     (Utc::now() + Duration::seconds(60), Ok::<_, String>(42))
/// });
/// assert_eq!(entry.get().await, Ok(42));
/// assert!(!entry.is_expired());
/// # }
/// ```
pub struct ExpiringEntry<T, E> {
    factory: Factory<T, E>,
    slot: RwLock<Slot<T, E>>,
    /// Serializes factory runs
    refresh_lock: Mutex<()>,
}

impl<T, E> ExpiringEntry<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an entry that computes nothing until first read
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Computed<T, E>> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || Box::pin(factory()) as BoxFuture<Computed<T, E>>),
            slot: RwLock::new(Slot {
                value: None,
                expires_at: DateTime::<Utc>::MIN_UTC,
            }),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns the current value, computing it first if absent or expired
    ///
    /// A memoized error is returned as-is until the entry expires.
    pub async fn get(&self) -> Result<T, E> {
        if let Some(current) = self.fresh() {
            return current;
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(current) = self.fresh() {
            return current;
        }

        self.compute().await
    }

    /// Recomputes the value regardless of expiration
    pub async fn refresh(&self) -> Result<T, E> {
        let _guard = self.refresh_lock.lock().await;
        self.compute().await
    }

    /// When the current value expires, `None` before the first computation
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let slot = self.slot.read();
        slot.value.as_ref().map(|_| slot.expires_at)
    }

    /// True when there is no value or it has expired
    pub fn is_expired(&self) -> bool {
        let slot = self.slot.read();
        slot.value.is_none() || Utc::now() >= slot.expires_at
    }

    /// Time left before expiration, zero when expired
    pub fn ttl(&self) -> Duration {
        match self.expires_at() {
            Some(expires_at) => (expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }

    fn fresh(&self) -> Option<Result<T, E>> {
        let slot = self.slot.read();
        match &slot.value {
            Some(value) if Utc::now() < slot.expires_at => Some(value.clone()),
            _ => None,
        }
    }

    async fn compute(&self) -> Result<T, E> {
        let (expires_at, value) = (self.factory)().await;

        let mut slot = self.slot.write();
        slot.expires_at = expires_at;
        slot.value = Some(value.clone());
        value
    }
}

impl<T, E> std::fmt::Debug for ExpiringEntry<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.read();
        f.debug_struct("ExpiringEntry")
            .field("computed", &slot.value.is_some())
            .field("expires_at", &slot.expires_at)
            .finish()
    }
}
