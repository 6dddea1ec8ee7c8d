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

use std::sync::Arc;

use crate::cap::CapTable;
use crate::sync::WaitSet;
use crate::usermem::AddressSpace;

/// The per-task ownership root.
///
/// Every kernel object a task creates is charged to it through the
/// capability table; the address space backs the copy helpers and the wait
/// set collects the task's interruptible sleepers.
pub struct Task {
    caps: CapTable,
    space: AddressSpace,
    waits: WaitSet,
}

impl Task {
    #[must_use]
    pub fn new() -> Arc<Task> {
        Arc::new(Self {
            caps: CapTable::new(),
            space: AddressSpace::new(),
            waits: WaitSet::new(),
        })
    }

    #[must_use]
    pub fn caps(&self) -> &CapTable {
        &self.caps
    }

    #[must_use]
    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    #[must_use]
    pub fn waits(&self) -> &WaitSet {
        &self.waits
    }

    /// Interrupts every interruptible wait the task's threads are blocked in.
    ///
    /// The mark is sticky; later interruptible waits fail immediately with
    /// `Interrupted`, matching a killed task.
    pub fn interrupt(&self) {
        self.waits.interrupt();
    }
}
