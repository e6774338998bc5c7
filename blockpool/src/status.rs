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

/// The outcome of a [`Pool::acquire`](crate::Pool::acquire) call.
///
/// A [`Lease`](crate::Lease) is holding an object if and only if its status is
/// [`Status::Success`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Status {
    /// An object was obtained.
    Success,
    /// The pool tried to grow and the factory returned an error.
    ConstructionFailed,
    /// The deadline elapsed before an object became available.
    Timeout,
    /// Any other failure, such as a panic in the factory.
    Unknown,
}

impl Status {
    /// Returns whether this status means an object was obtained.
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns a human-readable explanation of this status.
    pub fn explain(self) -> &'static str {
        match self {
            Status::Success => "object acquired",
            Status::ConstructionFailed => "failed to construct a new object",
            Status::Timeout => "timed out waiting for an available object",
            Status::Unknown => "unknown failure while acquiring an object",
        }
    }

    /// Converts this status into a `Result`.
    ///
    /// Returns `Ok(())` for [`Status::Success`]; otherwise, returns the matching
    /// [`AcquireError`].
    pub fn into_result(self) -> Result<(), AcquireError> {
        match self {
            Status::Success => Ok(()),
            Status::ConstructionFailed => Err(AcquireError::ConstructionFailed),
            Status::Timeout => Err(AcquireError::Timeout),
            Status::Unknown => Err(AcquireError::Unknown),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.explain())
    }
}

/// The error view of a failed [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum AcquireError {
    /// See [`Status::ConstructionFailed`].
    #[error("{}", Status::from(*self).explain())]
    ConstructionFailed,
    /// See [`Status::Timeout`].
    #[error("{}", Status::from(*self).explain())]
    Timeout,
    /// See [`Status::Unknown`].
    #[error("{}", Status::from(*self).explain())]
    Unknown,
}

impl From<AcquireError> for Status {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::ConstructionFailed => Status::ConstructionFailed,
            AcquireError::Timeout => Status::Timeout,
            AcquireError::Unknown => Status::Unknown,
        }
    }
}
