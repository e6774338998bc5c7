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
use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Weak;

use crate::AcquireError;
use crate::ManageObject;
use crate::ObjectId;
use crate::ObjectStats;
use crate::Status;
use crate::pool::ObjectState;
use crate::pool::Shared;

/// A handle to an object borrowed from a [`Pool`](crate::Pool).
///
/// A lease is either holding exactly one object or empty. Leases returned by a failed acquire are
/// empty from the start; a holding lease becomes empty once its object is released or detached.
///
/// This type implements [`Deref`] and [`DerefMut`], so a holding lease can be used as if it was of
/// type `M::Object`. Dereferencing an empty lease panics; check [`Lease::is_holding`] or use
/// [`Lease::get`] when the lease may be empty.
///
/// Dropping a holding lease returns its object to the pool. Assigning over a holding lease drops
/// the old value first, so its object is returned before the new one is adopted. Leases cannot be
/// cloned, which makes each object's return happen exactly once.
pub struct Lease<M: ManageObject> {
    state: Option<ObjectState<M::Object>>,
    status: Status,
    pool: Weak<Shared<M>>,
}

impl<M> fmt::Debug for Lease<M>
where
    M: ManageObject,
    M::Object: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("state", &self.state)
            .field("status", &self.status)
            .finish()
    }
}

impl<M: ManageObject> Drop for Lease<M> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<M: ManageObject> Deref for Lease<M> {
    type Target = M::Object;

    fn deref(&self) -> &M::Object {
        match self.get() {
            Some(o) => o,
            None => panic!("dereferenced an empty lease (status: {})", self.status),
        }
    }
}

impl<M: ManageObject> DerefMut for Lease<M> {
    fn deref_mut(&mut self) -> &mut M::Object {
        let status = self.status;
        match self.get_mut() {
            Some(o) => o,
            None => panic!("dereferenced an empty lease (status: {status})"),
        }
    }
}

impl<M: ManageObject> Lease<M> {
    pub(crate) fn holding(state: ObjectState<M::Object>, pool: Weak<Shared<M>>) -> Self {
        Self {
            state: Some(state),
            status: Status::Success,
            pool,
        }
    }

    pub(crate) fn empty(status: Status) -> Self {
        Self {
            state: None,
            status,
            pool: Weak::new(),
        }
    }

    /// Returns whether this lease holds an object.
    pub fn is_holding(&self) -> bool {
        self.state.is_some()
    }

    /// Returns the status of the acquire call that produced this lease.
    ///
    /// The status does not change when the object is later released or detached.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns a human-readable explanation of [`Lease::status`].
    pub fn explain(&self) -> &'static str {
        self.status.explain()
    }

    /// Returns the identity of the held object.
    pub fn id(&self) -> Option<ObjectId> {
        self.state.as_ref().map(|state| state.id)
    }

    /// Returns the statistics of the held object.
    pub fn stats(&self) -> Option<ObjectStats> {
        self.state.as_ref().map(|state| state.stats)
    }

    /// Returns a reference to the held object.
    pub fn get(&self) -> Option<&M::Object> {
        self.state.as_ref().map(|state| &state.o)
    }

    /// Returns a mutable reference to the held object.
    pub fn get_mut(&mut self) -> Option<&mut M::Object> {
        self.state.as_mut().map(|state| &mut state.o)
    }

    /// Returns the held object to the pool now, leaving this lease empty.
    ///
    /// Does nothing if the lease is already empty. If the pool has been dropped, the object is
    /// dropped instead.
    pub fn release(&mut self) {
        if let Some(state) = self.state.take() {
            if let Some(pool) = self.pool.upgrade() {
                pool.release(state);
            }
        }
    }

    /// Detaches the held object from the pool and returns it.
    ///
    /// This reduces the size of the pool by one. Returns `None` if the lease is empty.
    pub fn detach(mut self) -> Option<M::Object> {
        let ObjectState { id, mut o, .. } = self.state.take()?;
        if let Some(pool) = self.pool.upgrade() {
            pool.detach(id, &mut o);
        }
        Some(o)
    }

    /// Converts this lease into a `Result`, failing with the [`AcquireError`] matching its status.
    pub fn into_result(self) -> Result<Self, AcquireError> {
        self.status.into_result()?;
        Ok(self)
    }
}
