//! Readers over an application store.
//!
//! A store holds the current state and accepts actions. Readers that need it
//! run against a [`StoreContext`]: a snapshot of the state taken when the
//! reader is run, and the store's dispatch function.
//!
//! ```rust
//! use lector::store::{MemoryStore, Store, dispatch, get_state};
//!
//! let store = MemoryStore::new(|count: &i32, step: i32| count + step, 0);
//! dispatch::<i32, i32>(5).run_blocking(store.context().unwrap()).unwrap();
//!
//! let count = get_state::<i32, i32>().run_blocking(store.context().unwrap());
//! assert_eq!(count.unwrap(), 5);
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::reader::{Reader, asks};

/// The dispatch function of a store.
pub type Dispatch<A> = Arc<dyn Fn(A) -> Result<()> + Send + Sync>;

/// The context store readers run against.
pub struct StoreContext<S, A> {
    pub state: S,
    pub dispatch: Dispatch<A>,
}

impl<S, A> StoreContext<S, A> {
    pub fn new(state: S, dispatch: Dispatch<A>) -> Self {
        StoreContext { state, dispatch }
    }
}

impl<S: Clone, A> Clone for StoreContext<S, A> {
    fn clone(&self) -> Self {
        StoreContext {
            state: self.state.clone(),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<S: fmt::Debug, A> fmt::Debug for StoreContext<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Something that holds state and accepts actions.
pub trait Store {
    type State;
    type Action;

    /// A snapshot of the current state. In-memory stores never fail here;
    /// stores backed by something remote may.
    fn state(&self) -> Result<Self::State>;

    fn dispatcher(&self) -> Dispatch<Self::Action>;

    /// The context to run store readers against right now.
    fn context(&self) -> Result<StoreContext<Self::State, Self::Action>> {
        Ok(StoreContext::new(self.state()?, self.dispatcher()))
    }
}

type Reducer<S, A> = dyn Fn(&S, A) -> S + Send + Sync;

struct Inner<S, A> {
    state: RwLock<S>,
    reducer: Box<Reducer<S, A>>,
}

/// A store kept in memory, whose state only changes through its reducer.
pub struct MemoryStore<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Clone for MemoryStore<S, A> {
    fn clone(&self) -> Self {
        MemoryStore {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> MemoryStore<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: 'static,
{
    pub fn new<R>(reducer: R, initial: S) -> Self
    where
        R: Fn(&S, A) -> S + Send + Sync + 'static,
    {
        MemoryStore {
            inner: Arc::new(Inner {
                state: RwLock::new(initial),
                reducer: Box::new(reducer),
            }),
        }
    }

    /// Apply `action` to the current state.
    ///
    /// The reducer runs under the write lock, so concurrent dispatches are
    /// applied one after another. A reducer that panics leaves the state as it
    /// was and fails this dispatch with [`Error::Panicked`]; the store stays
    /// usable.
    pub fn dispatch(&self, action: A) -> Result<()> {
        let mut state = self.inner.state.write();
        let reduced = panic::catch_unwind(AssertUnwindSafe(|| (self.inner.reducer)(&*state, action)));
        match reduced {
            Ok(next) => {
                *state = next;
                debug!("store state replaced");
                Ok(())
            }
            Err(payload) => Err(Error::from_panic(payload)),
        }
    }

    /// A snapshot of the current state.
    pub fn snapshot(&self) -> S {
        self.inner.state.read().clone()
    }
}

impl<S, A> Store for MemoryStore<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: 'static,
{
    type State = S;
    type Action = A;

    fn state(&self) -> Result<S> {
        Ok(self.snapshot())
    }

    fn dispatcher(&self) -> Dispatch<A> {
        let store = self.clone();
        Arc::new(move |action| store.dispatch(action))
    }
}

/// A reader that resolves to the state of the context.
pub fn get_state<S, A>() -> Reader<StoreContext<S, A>, S>
where
    S: Clone + Send + Sync + 'static,
    A: 'static,
{
    asks(|context: &StoreContext<S, A>| context.state.clone())
}

/// A reader that dispatches `action` through the context every time it runs.
pub fn dispatch<S, A>(action: A) -> Reader<StoreContext<S, A>, ()>
where
    S: Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    Reader::new(move |context: &StoreContext<S, A>| (context.dispatch)(action.clone()))
}
