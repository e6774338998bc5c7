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

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use blockpool::AcquireError;
use blockpool::ManageObject;
use blockpool::Pool;
use blockpool::PoolConfig;
use blockpool::Status;

/// An object that counts its own destruction.
#[derive(Debug)]
struct Tracked {
    serial: usize,
    dropped: Arc<AtomicUsize>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

struct TrackedManager {
    created: AtomicUsize,
    detached: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

impl ManageObject for TrackedManager {
    type Object = Tracked;
    type Error = ();

    fn create(&self) -> Result<Self::Object, Self::Error> {
        Ok(Tracked {
            serial: self.created.fetch_add(1, Ordering::SeqCst),
            dropped: self.dropped.clone(),
        })
    }

    fn on_detached(&self, _o: &mut Self::Object) {
        self.detached.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    pool: Pool<TrackedManager>,
    detached: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

fn fixture(idle_limit: usize, max_limit: usize) -> Fixture {
    let detached = Arc::new(AtomicUsize::new(0));
    let dropped = Arc::new(AtomicUsize::new(0));
    let manager = TrackedManager {
        created: AtomicUsize::new(0),
        detached: detached.clone(),
        dropped: dropped.clone(),
    };
    Fixture {
        pool: Pool::new(PoolConfig::new(idle_limit, max_limit), manager),
        detached,
        dropped,
    }
}

#[test]
fn test_release_is_exactly_once() {
    let f = fixture(1, 1);

    let mut lease = f.pool.acquire(None);
    assert!(lease.is_holding());
    lease.release();
    assert!(!lease.is_holding());
    assert_eq!(lease.status(), Status::Success, "status survives release");

    let status = f.pool.status();
    assert_eq!(status.idle_count, 1);
    assert_eq!(status.leased_count, 0);

    // neither an explicit second release nor the drop may return the object again
    lease.release();
    drop(lease);
    let status = f.pool.status();
    assert_eq!(status.current_size, 1);
    assert_eq!(status.idle_count, 1);
    assert_eq!(f.dropped.load(Ordering::SeqCst), 0);
}

#[test]
fn test_empty_lease_is_inert() {
    let f = fixture(0, 1);
    let held = f.pool.acquire(None);

    let mut empty = f.pool.acquire(Some(Duration::from_millis(10)));
    assert_eq!(empty.status(), Status::Timeout);
    assert!(empty.id().is_none());
    assert!(empty.stats().is_none());
    assert!(empty.get_mut().is_none());
    empty.release();
    assert!(empty.detach().is_none());

    assert_eq!(f.pool.status().leased_count, 1);
    assert_eq!(f.pool.size(), 1);
    drop(held);
}

#[test]
#[should_panic(expected = "dereferenced an empty lease")]
fn test_deref_empty_lease_panics() {
    let f = fixture(0, 0);
    let empty = f.pool.acquire(Some(Duration::from_millis(1)));
    assert_eq!(empty.serial, 0);
}

#[test]
fn test_assign_over_holding_lease_releases_it() {
    let f = fixture(1, 2);

    let mut a = f.pool.acquire(None);
    let b = f.pool.acquire(None);
    let (a_id, b_id) = (a.id(), b.id());
    assert_ne!(a_id, b_id);
    assert_eq!(f.pool.status().leased_count, 2);

    a = b;
    assert_eq!(a.id(), b_id);
    let status = f.pool.status();
    assert_eq!(status.leased_count, 1);
    assert_eq!(status.idle_count, 1);

    // the object formerly held by `a` is the idle one
    let c = f.pool.acquire(None);
    assert_eq!(c.id(), a_id);
    drop((a, c));
    assert_eq!(f.pool.status().idle_count, 1);
}

#[test]
fn test_moved_lease_keeps_its_object() {
    let f = fixture(1, 1);
    let lease = f.pool.acquire(None);
    let id = lease.id();

    let moved = std::thread::spawn(move || {
        let moved = lease;
        moved.id()
    })
    .join()
    .unwrap();

    assert_eq!(moved, id);
    assert_eq!(f.pool.status().idle_count, 1);
}

#[test]
fn test_detach() {
    let f = fixture(1, 1);

    let lease = f.pool.acquire(None);
    let first_id = lease.id();
    let o = lease.detach().unwrap();
    assert_eq!(o.serial, 0);
    assert_eq!(f.pool.size(), 0);
    assert_eq!(f.detached.load(Ordering::SeqCst), 1);

    let lease = f.pool.acquire(Some(Duration::from_millis(50)));
    assert_eq!(lease.status(), Status::Success);
    assert_ne!(lease.id(), first_id);
    assert_eq!(lease.serial, 1);

    drop(o);
    assert_eq!(f.dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_eviction_destroys_object() {
    let f = fixture(0, 1);
    let lease = f.pool.acquire(None);
    drop(lease);

    assert_eq!(f.pool.size(), 0);
    assert_eq!(f.detached.load(Ordering::SeqCst), 1);
    assert_eq!(f.dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pool_teardown() {
    let f = fixture(2, 3);
    let idle = (f.pool.acquire(None), f.pool.acquire(None));
    let outstanding = f.pool.acquire(None);
    drop(idle);
    assert_eq!(f.pool.status().idle_count, 2);

    drop(f.pool);
    assert_eq!(f.dropped.load(Ordering::SeqCst), 2, "idle objects die with the pool");

    assert!(outstanding.is_holding());
    assert_eq!(outstanding.serial, 2);
    drop(outstanding);
    assert_eq!(f.dropped.load(Ordering::SeqCst), 3);
}

#[test]
fn test_into_result() {
    let f = fixture(0, 1);

    let held = f.pool.acquire(None).into_result().unwrap();
    assert_eq!(held.explain(), "object acquired");

    let err = f
        .pool
        .acquire(Some(Duration::from_millis(10)))
        .into_result()
        .unwrap_err();
    assert_eq!(err, AcquireError::Timeout);
    assert_eq!(Status::from(err), Status::Timeout);
}

#[test]
fn test_stats_track_recycling() {
    let f = fixture(1, 1);

    let lease = f.pool.acquire(None);
    let stats = lease.stats().unwrap();
    assert_eq!(stats.recycle_count(), 0);
    assert_eq!(stats.last_used(), stats.created());
    drop(lease);

    let lease = f.pool.acquire(None);
    let recycled = lease.stats().unwrap();
    assert_eq!(recycled.recycle_count(), 1);
    assert_eq!(recycled.created(), stats.created());
    assert!(recycled.last_used() >= recycled.created());
}
