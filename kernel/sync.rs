// Copyright 2026 The Sedge Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

//! Sleep locks and condition variables with timed, interruptible waits.
//!
//! These are the fabric's rendition of the sleep-lock collaborator: on a real
//! target they would be backed by the scheduler's wait queues; here they are
//! backed by the host's native primitives behind the same API.

pub mod condvar;
pub mod mutex;
pub mod wait;

pub use condvar::{Condvar, Sleep};
pub use mutex::{Mutex, MutexGuard};
pub use wait::WaitSet;
