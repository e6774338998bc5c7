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

//! A bounded, blocking object pool for Rust.
//!
//! Threads borrow an object with [`Pool::acquire`], use it through the returned [`Lease`], and
//! give it back by dropping the lease. The pool keeps at most `idle_limit` released objects for
//! reuse and never lets more than `max_limit` objects live at once; when that limit is reached,
//! `acquire` blocks until another lease is released or the timeout elapses.
//!
//! Failures do not panic or return the factory's error. Instead, the lease is empty and carries a
//! [`Status`] explaining what happened.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use blockpool::Construct;
//! use blockpool::ConstructWith;
//! use blockpool::Pool;
//! use blockpool::PoolConfig;
//! use blockpool::Status;
//!
//! struct Buffer(Vec<u8>);
//!
//! impl Construct<usize> for Buffer {
//!     type Error = std::convert::Infallible;
//!
//!     fn construct(capacity: &usize) -> Result<Self, Self::Error> {
//!         Ok(Buffer(Vec::with_capacity(*capacity)))
//!     }
//! }
//!
//! let pool: Pool<ConstructWith<Buffer, usize>> = Pool::with_args(PoolConfig::new(1, 1), 1024);
//!
//! let mut buf = pool.acquire(None);
//! assert_eq!(buf.status(), Status::Success);
//! buf.0.extend_from_slice(b"hello");
//!
//! // the only object is leased, so a second acquire times out
//! let other = pool.acquire(Some(Duration::from_millis(10)));
//! assert_eq!(other.status(), Status::Timeout);
//! assert!(!other.is_holding());
//!
//! let id = buf.id();
//! drop(buf);
//! let buf = pool.acquire(None);
//! assert_eq!(buf.id(), id);
//! assert_eq!(pool.size(), 1);
//! ```

mod lease;
mod manage;
mod mutex;
mod pool;
mod status;

pub use lease::Lease;
pub use manage::Construct;
pub use manage::ConstructWith;
pub use manage::CreateFn;
pub use manage::ManageObject;
pub use manage::ObjectId;
pub use manage::ObjectStats;
pub use pool::Pool;
pub use pool::PoolConfig;
pub use pool::PoolStatus;
pub use status::AcquireError;
pub use status::Status;
