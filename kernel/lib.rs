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

//! Asynchronous, capability-addressed IPC fabric.
//!
//! Tasks exchange fixed-size byte carriers ([`object::buffer::Buffer`])
//! through many-to-one FIFO queues ([`object::endpoint::Endpoint`]) and
//! multiplex over sets of either with [`object::caplist::Caplist`].  All
//! objects are addressed through per-task capability handles ([`cap`]) and
//! every operation is reachable through the raw syscall surface ([`syscall`]).

pub mod cap;
pub mod ipc;
pub mod object;
pub mod sync;
pub mod syscall;
pub mod task;
pub mod usermem;

pub use cap::{CapTable, Handle};
pub use object::caplist;
pub use object::ObjectType;
pub use task::Task;
