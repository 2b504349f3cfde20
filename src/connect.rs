//! Selectors that bind readers to a store.
//!
//! A set of [`Bindings`] maps names to either literal values or functions
//! returning readers over a [`StoreContext`]. [`connect_readers`] turns them
//! into a curried factory: given the store's dispatch function it produces a
//! [`Selector`], and given a state snapshot the selector produces
//! [`BoundProps`]. Literal bindings are passed through untouched; calling a
//! bound function runs its reader against that state and dispatch.
//!
//! ```rust
//! use lector::connect::{Bindings, connect_readers};
//! use lector::store::{MemoryStore, get_state};
//! use serde_json::{Value, json};
//!
//! let bindings = Bindings::<Value, Value>::new()
//!     .literal("title", json!("counter"))
//!     .function("count", |_| get_state::<Value, Value>().prop("count").into());
//!
//! let store = MemoryStore::new(|_: &Value, next: Value| next, json!({"count": 3}));
//! let props = connect_readers(bindings).connect(&store).unwrap();
//!
//! assert_eq!(props.value("title"), Some(&json!("counter")));
//! assert_eq!(props.call("count", &[]).unwrap(), json!(3));
//! ```

use std::fmt;
use std::sync::Arc;

use futures::executor::block_on;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::reader::{Lift, ReaderFuture};
use crate::store::{Dispatch, Store, StoreContext};

type BindingFn<S, A> = dyn Fn(&[Value]) -> Lift<StoreContext<S, A>, Value> + Send + Sync;

/// One named entry of a set of [`Bindings`].
pub enum Binding<S, A> {
    Literal(Value),
    Function(Arc<BindingFn<S, A>>),
}

impl<S, A> Clone for Binding<S, A> {
    fn clone(&self) -> Self {
        match self {
            Binding::Literal(value) => Binding::Literal(value.clone()),
            Binding::Function(f) => Binding::Function(Arc::clone(f)),
        }
    }
}

impl<S, A> fmt::Debug for Binding<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Binding::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Named literals and reader functions, in insertion order.
pub struct Bindings<S, A> {
    entries: IndexMap<String, Binding<S, A>>,
}

impl<S, A> Default for Bindings<S, A> {
    fn default() -> Self {
        Bindings {
            entries: IndexMap::new(),
        }
    }
}

impl<S, A> Clone for Bindings<S, A> {
    fn clone(&self) -> Self {
        Bindings {
            entries: self.entries.clone(),
        }
    }
}

impl<S, A> fmt::Debug for Bindings<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<S, A> Bindings<S, A> {
    pub fn new() -> Self {
        Bindings::default()
    }

    /// Bind `key` to a value handed through as is.
    pub fn literal(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), Binding::Literal(value));
        self
    }

    /// Bind `key` to a function of call arguments returning a reader, or
    /// anything else that lifts into one.
    pub fn function<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Lift<StoreContext<S, A>, Value> + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Binding::Function(Arc::new(f)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the selector factory for `bindings`.
pub fn connect_readers<S, A>(bindings: Bindings<S, A>) -> SelectorFactory<S, A> {
    SelectorFactory {
        bindings: Arc::new(bindings.entries),
    }
}

/// The first stage of a connected selector, waiting for a dispatch function.
pub struct SelectorFactory<S, A> {
    bindings: Arc<IndexMap<String, Binding<S, A>>>,
}

impl<S, A> Clone for SelectorFactory<S, A> {
    fn clone(&self) -> Self {
        SelectorFactory {
            bindings: Arc::clone(&self.bindings),
        }
    }
}

impl<S, A> SelectorFactory<S, A> {
    pub fn bind(&self, dispatch: Dispatch<A>) -> Selector<S, A> {
        Selector {
            bindings: Arc::clone(&self.bindings),
            dispatch,
        }
    }

    /// Bind to `store` and select its current state in one go.
    pub fn connect<St>(&self, store: &St) -> Result<BoundProps<S, A>>
    where
        St: Store<State = S, Action = A>,
    {
        Ok(self.bind(store.dispatcher()).select(store.state()?))
    }
}

/// A selector bound to a dispatch function.
pub struct Selector<S, A> {
    bindings: Arc<IndexMap<String, Binding<S, A>>>,
    dispatch: Dispatch<A>,
}

impl<S, A> Clone for Selector<S, A> {
    fn clone(&self) -> Self {
        Selector {
            bindings: Arc::clone(&self.bindings),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<S, A> Selector<S, A> {
    /// Produce the props for one state snapshot.
    pub fn select(&self, state: S) -> BoundProps<S, A> {
        trace!(bindings = self.bindings.len(), "selecting props");
        let context = Arc::new(StoreContext::new(state, Arc::clone(&self.dispatch)));
        let entries = self
            .bindings
            .iter()
            .map(|(key, binding)| {
                let prop = match binding {
                    Binding::Literal(value) => BoundProp::Value(value.clone()),
                    Binding::Function(f) => BoundProp::Function(BoundFn {
                        f: Arc::clone(f),
                        context: Arc::clone(&context),
                    }),
                };
                (key.clone(), prop)
            })
            .collect();
        BoundProps { entries }
    }
}

/// A binding function closed over one store context.
pub struct BoundFn<S, A> {
    f: Arc<BindingFn<S, A>>,
    context: Arc<StoreContext<S, A>>,
}

impl<S, A> Clone for BoundFn<S, A> {
    fn clone(&self) -> Self {
        BoundFn {
            f: Arc::clone(&self.f),
            context: Arc::clone(&self.context),
        }
    }
}

impl<S, A> BoundFn<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    /// Run the reader returned for `args` and wait for its value.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        block_on(self.call_async(args))
    }

    pub fn call_async(&self, args: &[Value]) -> ReaderFuture<Value> {
        Lift::catching(|| (self.f)(args)).resolve(Arc::clone(&self.context))
    }
}

/// One selected prop.
pub enum BoundProp<S, A> {
    Value(Value),
    Function(BoundFn<S, A>),
}

impl<S, A> Clone for BoundProp<S, A> {
    fn clone(&self) -> Self {
        match self {
            BoundProp::Value(value) => BoundProp::Value(value.clone()),
            BoundProp::Function(f) => BoundProp::Function(f.clone()),
        }
    }
}

impl<S, A> fmt::Debug for BoundProp<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundProp::Value(value) => f.debug_tuple("Value").field(value).finish(),
            BoundProp::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// The props selected for one state snapshot, in binding order.
pub struct BoundProps<S, A> {
    entries: IndexMap<String, BoundProp<S, A>>,
}

impl<S, A> Clone for BoundProps<S, A> {
    fn clone(&self) -> Self {
        BoundProps {
            entries: self.entries.clone(),
        }
    }
}

impl<S, A> fmt::Debug for BoundProps<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<S, A> BoundProps<S, A> {
    pub fn get(&self, key: &str) -> Option<&BoundProp<S, A>> {
        self.entries.get(key)
    }

    /// The literal bound to `key`, if `key` is a literal.
    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.entries.get(key)? {
            BoundProp::Value(value) => Some(value),
            BoundProp::Function(_) => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S, A> BoundProps<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    /// Call the function bound to `key`.
    ///
    /// Fails with [`Error::InvalidArgument`] when `key` is unknown or bound
    /// to a literal.
    pub fn call(&self, key: &str, args: &[Value]) -> Result<Value> {
        match self.entries.get(key) {
            Some(BoundProp::Function(f)) => f.call(args),
            Some(BoundProp::Value(_)) => Err(Error::InvalidArgument(format!("`{key}` is not a function"))),
            None => Err(Error::InvalidArgument(format!("no binding named `{key}`"))),
        }
    }
}
