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

//! The pool handle and the shared pool state.
//!
//! All bookkeeping lives in one [`Slots`] value guarded by a single mutex. Threads that cannot
//! obtain an object block on a condition variable paired with that mutex, and every release wakes
//! one of them. Objects are created outside the lock: a slot is reserved first and handed back if
//! the factory fails.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::Instant;

use crate::AcquireError;
use crate::Construct;
use crate::ConstructWith;
use crate::CreateFn;
use crate::Lease;
use crate::ManageObject;
use crate::ObjectId;
use crate::ObjectStats;
use crate::Status;
use crate::mutex::Condvar;
use crate::mutex::Mutex;

/// The configuration of [`Pool`].
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Maximum number of idle objects kept for reuse.
    pub idle_limit: usize,

    /// Maximum number of live objects, idle and leased together.
    ///
    /// The pool never honors a value smaller than `idle_limit`; see
    /// [`PoolConfig::effective_max_limit`].
    pub max_limit: usize,
}

impl PoolConfig {
    /// Creates a new [`PoolConfig`].
    pub fn new(idle_limit: usize, max_limit: usize) -> Self {
        Self {
            idle_limit,
            max_limit,
        }
    }

    /// Returns a new [`PoolConfig`] with the specified idle limit.
    pub fn with_idle_limit(mut self, idle_limit: usize) -> Self {
        self.idle_limit = idle_limit;
        self
    }

    /// Returns a new [`PoolConfig`] with the specified max limit.
    pub fn with_max_limit(mut self, max_limit: usize) -> Self {
        self.max_limit = max_limit;
        self
    }

    /// Returns the max limit the pool enforces, that is, `max(idle_limit, max_limit)`.
    pub fn effective_max_limit(&self) -> usize {
        self.max_limit.max(self.idle_limit)
    }
}

/// The current pool status.
///
/// See [`Pool::status`].
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct PoolStatus {
    /// The maximum number of idle objects.
    pub idle_limit: usize,

    /// The effective maximum number of live objects.
    pub max_limit: usize,

    /// The number of live objects, including those being created.
    pub current_size: usize,

    /// The number of idle objects in the pool.
    pub idle_count: usize,

    /// The number of objects currently leased.
    pub leased_count: usize,

    /// The number of threads blocked in [`Pool::acquire`].
    pub wait_count: usize,
}

/// A bounded, blocking object pool.
///
/// Cloning a [`Pool`] yields another handle to the same pool.
pub struct Pool<M: ManageObject> {
    shared: Arc<Shared<M>>,
}

impl<M: ManageObject> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<M> fmt::Debug for Pool<M>
where
    M: ManageObject,
    M::Object: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle_limit", &self.shared.idle_limit)
            .field("max_limit", &self.shared.max_limit)
            .field("slots", &self.shared.slots)
            .finish()
    }
}

impl<M: ManageObject> Pool<M> {
    /// Creates a new [`Pool`] whose objects are created by `manager`.
    pub fn new(config: PoolConfig, manager: M) -> Self {
        let idle_limit = config.idle_limit;
        let max_limit = config.effective_max_limit();
        let slots = Mutex::new(Slots {
            idle: HashMap::with_capacity(idle_limit),
            leased: HashSet::new(),
            creating: 0,
            current_size: 0,
            waiting: 0,
            next_id: 0,
        });

        let shared = Arc::new(Shared {
            idle_limit,
            max_limit,
            manager,
            slots,
            available: Condvar::new(),
        });
        Self { shared }
    }

    /// Retrieves an object from this [`Pool`].
    ///
    /// If no object is idle and the pool is at its max limit, this method blocks until an object
    /// is released or detached. `timeout` bounds the wait; `None`, a zero duration, or a duration
    /// too large to express as a deadline waits without deadline.
    ///
    /// This method never fails loudly: the returned [`Lease`] carries a [`Status`] and is empty
    /// unless the status is [`Status::Success`].
    pub fn acquire(&self, timeout: Option<Duration>) -> Lease<M> {
        let deadline = timeout
            .filter(|timeout| !timeout.is_zero())
            .and_then(|timeout| Instant::now().checked_add(timeout));

        let shared = &self.shared;
        let Some(mut slots) = shared.wait_available(shared.slots.lock(), deadline) else {
            tracing::debug!(?timeout, "timed out waiting for an available object");
            return Lease::empty(Status::Timeout);
        };

        if let Some(mut state) = slots.pop_idle() {
            slots.leased.insert(state.id);
            slots.check_invariants(shared.max_limit);
            drop(slots);

            state.stats.recycle_count += 1;
            state.stats.recycled = Some(Instant::now());
            tracing::trace!(object = %state.id, "reusing idle object");
            return Lease::holding(state, Arc::downgrade(shared));
        }

        // reserve a slot so that concurrent creations never exceed the max limit
        let id = slots.next_id();
        slots.current_size += 1;
        slots.creating += 1;
        drop(slots);

        match shared.create(id) {
            Ok(state) => Lease::holding(state, Arc::downgrade(shared)),
            Err(status) => Lease::empty(status),
        }
    }

    /// Retrieves an object like [`Pool::acquire`], returning an error instead of an empty lease.
    pub fn try_acquire(&self, timeout: Option<Duration>) -> Result<Lease<M>, AcquireError> {
        self.acquire(timeout).into_result()
    }

    /// Returns the number of live objects, idle and leased together.
    ///
    /// This is a point-in-time snapshot and says nothing about the next [`Pool::acquire`].
    pub fn size(&self) -> usize {
        self.shared.slots.lock().current_size
    }

    /// Returns the current status of the pool.
    pub fn status(&self) -> PoolStatus {
        let slots = self.shared.slots.lock();
        PoolStatus {
            idle_limit: self.shared.idle_limit,
            max_limit: self.shared.max_limit,
            current_size: slots.current_size,
            idle_count: slots.idle.len(),
            leased_count: slots.leased.len(),
            wait_count: slots.waiting,
        }
    }

    /// Returns the manager that creates this pool's objects.
    pub fn manager(&self) -> &M {
        &self.shared.manager
    }
}

impl<T, Args> Pool<ConstructWith<T, Args>>
where
    T: Construct<Args> + Send,
    Args: Send + Sync,
{
    /// Creates a new [`Pool`] that builds each object with `T::construct(&args)`.
    pub fn with_args(config: PoolConfig, args: Args) -> Self {
        Self::new(config, ConstructWith::new(args))
    }
}

impl<F, T, E> Pool<CreateFn<F>>
where
    F: Fn() -> Result<T, E> + Send + Sync,
    T: Send,
    E: fmt::Debug,
{
    /// Creates a new [`Pool`] that builds each object by calling `f`.
    pub fn from_fn(config: PoolConfig, f: F) -> Self {
        Self::new(config, CreateFn::new(f))
    }
}

pub(crate) struct Shared<M: ManageObject> {
    idle_limit: usize,
    max_limit: usize,
    manager: M,
    slots: Mutex<Slots<M::Object>>,
    /// Signalled whenever an idle object or a free slot may have appeared.
    available: Condvar,
}

impl<M: ManageObject> Shared<M> {
    /// Blocks until an object can be obtained or `deadline` passes.
    ///
    /// Returns `None` on timeout.
    fn wait_available<'a>(
        &self,
        mut slots: MutexGuard<'a, Slots<M::Object>>,
        deadline: Option<Instant>,
    ) -> Option<MutexGuard<'a, Slots<M::Object>>> {
        slots.waiting += 1;
        let available = loop {
            if slots.is_available(self.max_limit) {
                break true;
            }

            match deadline {
                None => slots = self.available.wait(slots),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break false;
                    }
                    slots = self.available.wait_timeout(slots, remaining);
                }
            }
        };
        slots.waiting -= 1;
        available.then_some(slots)
    }

    /// Creates the object for a slot already reserved by the caller.
    fn create(&self, id: ObjectId) -> Result<ObjectState<M::Object>, Status> {
        let reservation = scopeguard::guard((), |()| self.cancel_reservation());

        match panic::catch_unwind(AssertUnwindSafe(|| self.manager.create())) {
            Ok(Ok(o)) => {
                scopeguard::ScopeGuard::into_inner(reservation);

                let mut slots = self.slots.lock();
                slots.creating -= 1;
                slots.leased.insert(id);
                slots.check_invariants(self.max_limit);
                drop(slots);

                tracing::trace!(object = %id, "created new object");
                Ok(ObjectState {
                    id,
                    o,
                    stats: ObjectStats::default(),
                })
            }
            Ok(Err(err)) => {
                tracing::debug!(?err, "failed to create object");
                Err(Status::ConstructionFailed)
            }
            Err(_) => {
                tracing::warn!("object factory panicked");
                Err(Status::Unknown)
            }
        }
    }

    fn cancel_reservation(&self) {
        let mut slots = self.slots.lock();
        slots.current_size -= 1;
        slots.creating -= 1;
        slots.check_invariants(self.max_limit);
        drop(slots);

        self.available.notify_one();
    }

    /// Returns a leased object to the pool.
    ///
    /// An object whose identity is not in the leased set is dropped without touching the pool.
    pub(crate) fn release(&self, state: ObjectState<M::Object>) {
        let mut slots = self.slots.lock();
        if !slots.leased.remove(&state.id) {
            drop(slots);
            return;
        }

        let evicted = if slots.idle.len() < self.idle_limit {
            slots.idle.insert(state.id, state);
            None
        } else {
            slots.current_size -= 1;
            Some(state)
        };
        slots.check_invariants(self.max_limit);
        drop(slots);

        self.available.notify_one();

        if let Some(mut state) = evicted {
            tracing::trace!(object = %state.id, "evicting released object");
            self.manager.on_detached(&mut state.o);
        }
    }

    /// Removes a leased object from the pool's bookkeeping without taking it back.
    pub(crate) fn detach(&self, id: ObjectId, o: &mut M::Object) {
        let mut slots = self.slots.lock();
        if !slots.leased.remove(&id) {
            return;
        }
        slots.current_size -= 1;
        slots.check_invariants(self.max_limit);
        drop(slots);

        self.available.notify_one();

        tracing::trace!(object = %id, "detached object");
        self.manager.on_detached(o);
    }
}

#[derive(Debug)]
struct Slots<T> {
    idle: HashMap<ObjectId, ObjectState<T>>,
    leased: HashSet<ObjectId>,
    /// Slots reserved by threads running the factory.
    creating: usize,
    current_size: usize,
    waiting: usize,
    next_id: u64,
}

impl<T> Slots<T> {
    fn is_available(&self, max_limit: usize) -> bool {
        !self.idle.is_empty() || self.current_size < max_limit
    }

    fn pop_idle(&mut self) -> Option<ObjectState<T>> {
        let id = *self.idle.keys().next()?;
        self.idle.remove(&id)
    }

    fn next_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check_invariants(&self, max_limit: usize) {
        assert!(
            self.current_size <= max_limit,
            "invariant broken: current_size <= max_limit (actual: {} <= {})",
            self.current_size,
            max_limit,
        );

        let tracked = self.idle.len() + self.leased.len() + self.creating;
        assert_eq!(
            tracked, self.current_size,
            "invariant broken: idle + leased + creating == current_size",
        );
    }
}

#[derive(Debug)]
pub(crate) struct ObjectState<T> {
    pub(crate) id: ObjectId,
    pub(crate) o: T,
    pub(crate) stats: ObjectStats,
}
