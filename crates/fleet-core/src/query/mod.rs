//! Reactive query controller
//!
//! A [`ReactiveQueryController`] owns a parameter tuple and a query function.
//! Whenever the parameters change value the query is re-issued on a spawned
//! task. Every issue bumps a generation counter; a settling query whose
//! generation is no longer current is discarded, which gives last-write-wins
//! semantics without cancelling anything in flight.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::{FleetError, Result};
use crate::events::{ListenerId, Listeners};

/// Boxed future returned by a query function
pub type QueryFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

type QueryFn<P, T> = dyn Fn(P) -> QueryFuture<T> + Send + Sync;

/// Latest state of a reactive query.
///
/// Once `is_loading` is false after a settlement exactly one of `data` and
/// `error` is set. Both are unset while the very first query is in flight;
/// later queries keep the previous outcome visible until they settle.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub error: Option<FleetError>,
    pub is_loading: bool,
}

impl<T> QueryResult<T> {
    /// A result that has never been loaded
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
        }
    }

    /// A settled, successful result
    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            is_loading: false,
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.is_loading && (self.data.is_some() || self.error.is_some())
    }
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Snapshot published on the controller's watch channel
#[derive(Debug, Clone)]
pub struct QuerySnapshot<P, T> {
    pub params: Option<P>,
    pub generation: u64,
    pub result: QueryResult<T>,
}

impl<P, T> QuerySnapshot<P, T> {
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.result.is_loading = true;
        self.generation
    }
}

/// Outcome of a non-stale settlement, handed to `on_settled` listeners
#[derive(Debug, Clone)]
pub struct Settlement<P, T> {
    pub params: P,
    pub outcome: Result<T>,
}

/// Re-issues a query whenever its parameters change
pub struct ReactiveQueryController<P, T> {
    name: &'static str,
    query: Arc<QueryFn<P, T>>,
    state: Arc<watch::Sender<QuerySnapshot<P, T>>>,
    settled_listeners: Arc<Listeners<Settlement<P, T>>>,
}

impl<P, T> Clone for ReactiveQueryController<P, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            query: Arc::clone(&self.query),
            state: Arc::clone(&self.state),
            settled_listeners: Arc::clone(&self.settled_listeners),
        }
    }
}

impl<P, T> ReactiveQueryController<P, T>
where
    P: Clone + PartialEq + Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create a controller with no parameters; nothing is fetched until
    /// [`set_params`](Self::set_params) is first called.
    pub fn new<F, Fut>(name: &'static str, query: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let query: Arc<QueryFn<P, T>> =
            Arc::new(move |params: P| -> QueryFuture<T> { Box::pin(query(params)) });
        let (state, _) = watch::channel(QuerySnapshot {
            params: None,
            generation: 0,
            result: QueryResult::idle(),
        });

        Self {
            name,
            query,
            state: Arc::new(state),
            settled_listeners: Arc::new(Listeners::new()),
        }
    }

    /// Set the parameters, re-querying if they differ from the current ones.
    ///
    /// Returns whether a query was issued. `is_loading` is already true when
    /// this returns; the query itself runs on a spawned task.
    pub fn set_params(&self, params: P) -> bool {
        let mut issued = None;
        self.state.send_if_modified(|state| {
            if state.params.as_ref() == Some(&params) {
                return false;
            }
            state.params = Some(params.clone());
            issued = Some(state.begin());
            true
        });

        match issued {
            Some(generation) => {
                debug!(query = self.name, generation, ?params, "Parameters changed, querying");
                self.spawn_query(generation, params);
                true
            }
            None => false,
        }
    }

    /// Re-run the query with the current parameters.
    ///
    /// The query is issued before this returns; the returned future resolves
    /// once the controller has settled, i.e. after the most recent query
    /// (this one or a later one) completes. Without parameters nothing is
    /// issued and the current result is returned.
    pub fn refetch(&self) -> impl Future<Output = QueryResult<T>> + Send + 'static {
        let mut issued = None;
        self.state.send_if_modified(|state| match state.params.clone() {
            Some(params) => {
                issued = Some((state.begin(), params));
                true
            }
            None => false,
        });

        if let Some((generation, params)) = issued {
            debug!(query = self.name, generation, ?params, "Refetching");
            self.spawn_query(generation, params);
        }

        let this = self.clone();
        async move { this.settled().await }
    }

    /// Wait until no query is in flight and return the result
    pub async fn settled(&self) -> QueryResult<T> {
        let mut rx = self.state.subscribe();
        let result = match rx.wait_for(|state| !state.result.is_loading).await {
            Ok(state) => state.result.clone(),
            Err(_) => self.result(),
        };
        result
    }

    pub fn result(&self) -> QueryResult<T> {
        self.state.borrow().result.clone()
    }

    pub fn params(&self) -> Option<P> {
        self.state.borrow().params.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().result.is_loading
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Receiver notified on every parameter change and settlement
    pub fn watch(&self) -> watch::Receiver<QuerySnapshot<P, T>> {
        self.state.subscribe()
    }

    /// Register a callback for every settlement that is not stale
    pub fn on_settled(
        &self,
        callback: impl Fn(&Settlement<P, T>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.settled_listeners.on(callback)
    }

    fn spawn_query(&self, generation: u64, params: P) {
        let query = Arc::clone(&self.query);
        let state = Arc::clone(&self.state);
        let listeners = Arc::clone(&self.settled_listeners);
        let name = self.name;

        tokio::spawn(async move {
            // A panicking query surfaces as an error instead of leaving the
            // controller loading forever
            let outcome = match tokio::spawn(query(params.clone())).await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(FleetError::Query(format!("query task failed: {join_error}"))),
            };

            let current = state.send_if_modified(|state| {
                if state.generation != generation {
                    return false;
                }
                state.result.is_loading = false;
                match &outcome {
                    Ok(data) => {
                        state.result.data = Some(data.clone());
                        state.result.error = None;
                    }
                    Err(error) => {
                        state.result.data = None;
                        state.result.error = Some(error.clone());
                    }
                }
                true
            });

            if !current {
                debug!(query = name, generation, "Discarding stale result");
                return;
            }
            if let Err(error) = &outcome {
                debug!(query = name, generation, %error, "Query failed");
            }

            listeners.emit(&Settlement { params, outcome });
        });
    }
}
