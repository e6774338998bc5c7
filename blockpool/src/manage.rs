// Copyright 2025 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::marker::PhantomData;
use std::time::Instant;

/// The identity of an object created by a pool.
///
/// Identities are unique within one pool and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub(crate) u64);

impl ObjectId {
    /// Returns the raw value of this identity.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Statistics regarding an object handed out by the pool.
#[derive(Debug, Clone, Copy)]
pub struct ObjectStats {
    created: Instant,
    pub(crate) recycled: Option<Instant>,
    pub(crate) recycle_count: usize,
}

impl Default for ObjectStats {
    fn default() -> Self {
        Self {
            created: Instant::now(),
            recycled: None,
            recycle_count: 0,
        }
    }
}

impl ObjectStats {
    /// Returns the instant when this object was created.
    pub fn created(&self) -> Instant {
        self.created
    }

    /// Returns the instant when this object was last handed out again after a release.
    pub fn last_used(&self) -> Instant {
        self.recycled.unwrap_or(self.created)
    }

    /// Returns the number of times the object was reused from the idle set.
    pub fn recycle_count(&self) -> usize {
        self.recycle_count
    }
}

/// A trait whose instance creates new objects for a pool.
///
/// `create` is called without the pool lock held, so several threads may be creating objects
/// at the same time.
pub trait ManageObject: Send + Sync {
    /// The type of objects that this instance creates.
    type Object: Send;

    /// The type of errors that this instance can return.
    type Error: fmt::Debug;

    /// Creates a new object.
    fn create(&self) -> Result<Self::Object, Self::Error>;

    /// A callback invoked when an object leaves the pool for good, either because it was
    /// evicted on release or because it was detached by its lease.
    ///
    /// If this instance does not hold any references to the object, then the default
    /// implementation can be used which does nothing.
    fn on_detached(&self, _o: &mut Self::Object) {}
}

/// A resource type that can be built from a fixed set of arguments.
pub trait Construct<Args>: Sized {
    /// The type of errors returned when construction fails.
    type Error: fmt::Debug;

    /// Builds a new instance from `args`.
    fn construct(args: &Args) -> Result<Self, Self::Error>;
}

/// A [`ManageObject`] that binds an argument set once and builds every object with
/// [`Construct::construct`].
///
/// See [`Pool::with_args`](crate::Pool::with_args).
pub struct ConstructWith<T, Args> {
    args: Args,
    _marker: PhantomData<fn() -> T>,
}

impl<T, Args> ConstructWith<T, Args> {
    /// Creates a new [`ConstructWith`] bound to `args`.
    pub fn new(args: Args) -> Self {
        Self {
            args,
            _marker: PhantomData,
        }
    }

    /// Returns the bound arguments.
    pub fn args(&self) -> &Args {
        &self.args
    }
}

impl<T, Args: fmt::Debug> fmt::Debug for ConstructWith<T, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructWith")
            .field("args", &self.args)
            .finish()
    }
}

impl<T, Args> ManageObject for ConstructWith<T, Args>
where
    T: Construct<Args> + Send,
    Args: Send + Sync,
{
    type Object = T;
    type Error = T::Error;

    fn create(&self) -> Result<T, T::Error> {
        T::construct(&self.args)
    }
}

/// A [`ManageObject`] backed by a closure.
///
/// See [`Pool::from_fn`](crate::Pool::from_fn).
pub struct CreateFn<F>(F);

impl<F> CreateFn<F> {
    /// Creates a new [`CreateFn`] that calls `f` for every new object.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> fmt::Debug for CreateFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateFn").finish_non_exhaustive()
    }
}

impl<F, T, E> ManageObject for CreateFn<F>
where
    F: Fn() -> Result<T, E> + Send + Sync,
    T: Send,
    E: fmt::Debug,
{
    type Object = T;
    type Error = E;

    fn create(&self) -> Result<T, E> {
        (self.0)()
    }
}
