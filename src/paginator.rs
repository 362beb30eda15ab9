//! Cursor-driven "load next page" controller shared by the list screens.
//!
//! The next cursor comes from a caller-supplied function instead of being derived from
//! the fetched page, which lets one paginator switch between sources (folders, then
//! files) without the paginator knowing about either.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

type PaginatorFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type LoadUpdated = Box<dyn Fn(bool) + Send + Sync>;
type Request<K, T> = Box<dyn Fn(K) -> PaginatorFuture<Result<Vec<T>, String>> + Send + Sync>;
type NextKey<K> = Box<dyn Fn() -> PaginatorFuture<K> + Send + Sync>;
type Success<K, T> = Box<dyn Fn(Vec<T>, K) -> PaginatorFuture<()> + Send + Sync>;
type Failure = Box<dyn Fn(String) -> PaginatorFuture<()> + Send + Sync>;

pub struct Paginator<K, T> {
    initial_key: K,
    current_key: Mutex<K>,
    in_flight: AtomicBool,
    on_load_updated: LoadUpdated,
    on_request: Request<K, T>,
    get_next_key: NextKey<K>,
    on_success: Success<K, T>,
    on_error: Failure,
}

impl<K, T> Paginator<K, T>
where
    K: Clone + Send + 'static,
    T: Send + 'static,
{
    pub fn new<L, R, RF, N, NF, S, SF>(
        initial_key: K,
        on_load_updated: L,
        on_request: R,
        get_next_key: N,
        on_success: S,
    ) -> Self
    where
        L: Fn(bool) + Send + Sync + 'static,
        R: Fn(K) -> RF + Send + Sync + 'static,
        RF: Future<Output = Result<Vec<T>, String>> + Send + 'static,
        N: Fn() -> NF + Send + Sync + 'static,
        NF: Future<Output = K> + Send + 'static,
        S: Fn(Vec<T>, K) -> SF + Send + Sync + 'static,
        SF: Future<Output = ()> + Send + 'static,
    {
        Self {
            current_key: Mutex::new(initial_key.clone()),
            initial_key,
            in_flight: AtomicBool::new(false),
            on_load_updated: Box::new(on_load_updated),
            on_request: Box::new(move |key| Box::pin(on_request(key))),
            get_next_key: Box::new(move || Box::pin(get_next_key())),
            on_success: Box::new(move |items, key| Box::pin(on_success(items, key))),
            on_error: Box::new(|_| Box::pin(async {})),
        }
    }

    pub fn with_error_handler<E, EF>(mut self, on_error: E) -> Self
    where
        E: Fn(String) -> EF + Send + Sync + 'static,
        EF: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Box::new(move |message| Box::pin(on_error(message)));
        self
    }

    /// Returns immediately while another load on this instance is still pending.
    pub async fn load_next_items(&self) {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return;
        }
        let guard = LoadGuard { paginator: self };
        (self.on_load_updated)(true);

        let key = self.current_key();
        let result = (self.on_request)(key).await;
        drop(guard);

        match result {
            Ok(items) => {
                let next_key = (self.get_next_key)().await;
                *self.current_key.lock().unwrap_or_else(PoisonError::into_inner) = next_key.clone();
                (self.on_success)(items, next_key).await;
            }
            Err(message) => {
                tracing::warn!(error = %message, "page request failed");
                (self.on_error)(message).await;
            }
        }
    }

    /// Restores the initial cursor. A load already in flight is left alone.
    pub fn reset(&self) {
        *self.current_key.lock().unwrap_or_else(PoisonError::into_inner) = self.initial_key.clone();
    }

    pub fn current_key(&self) -> K {
        self.current_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Ends a load when dropped, including when the load future itself is dropped mid-request.
struct LoadGuard<'a, K, T> {
    paginator: &'a Paginator<K, T>,
}

impl<K, T> Drop for LoadGuard<'_, K, T> {
    fn drop(&mut self) {
        self.paginator.in_flight.store(false, Ordering::Release);
        (self.paginator.on_load_updated)(false);
    }
}
