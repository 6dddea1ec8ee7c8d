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

use std::sync::{Arc, Weak};

use status::{Error, Result};

use crate::object::Kobject;
use crate::sync::{Condvar, Mutex, MutexGuard};
use crate::usermem::AddressSpace;

/// State of a buffer.
///
/// Transitions are `Ready → Pending` (send), `Pending → Finished` (finish,
/// or a receive-side failure), `Finished → Ready` (wait).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BufState {
    Ready,
    Pending,
    Finished,
}

/// An IPC buffer.
///
/// Buffers are the unit of information exchange between communicating
/// parties.  Each buffer has a fixed size specified at allocation and can be
/// used for an indefinite number of round-trips.
///
/// INVARIANTS (all under the buffer mutex):
/// * `used <= size`.
/// * At most one of `in_ep` / `in_ep_caplist` is set, and either being set
///   implies the state is `Pending`.
/// * A `Finished` buffer is linked into no endpoint queue, but may sit in a
///   buffer caplist's ready-queue.
pub struct Buffer {
    label: usize,
    size: usize,
    inner: Mutex<BufferInner>,
    cv: Condvar,
}

pub(crate) struct BufferInner {
    pub state: BufState,
    /// Terminal result of the round-trip; meaningful once `Finished`.
    pub wait_result: Result<()>,
    /// How much of `data` contains valid bytes.
    pub used: usize,
    pub data: Box<[u8]>,
    /// Label of the last endpoint which received the buffer.
    pub ep_label: usize,
    /// Endpoint in whose queue the buffer currently sits, if any.
    pub in_ep: Option<Weak<Kobject>>,
    /// Endpoint caplist in whose ready-queue the buffer currently sits, if any.
    pub in_ep_caplist: Option<Weak<Kobject>>,
}

impl Buffer {
    /// Allocates a buffer with `size` bytes of zeroed storage.
    pub fn alloc(size: usize, label: usize) -> Result<Buffer> {
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory)?;
        data.resize(size, 0);
        Ok(Self {
            label,
            size,
            inner: Mutex::new(BufferInner {
                state: BufState::Ready,
                wait_result: Ok(()),
                used: 0,
                data: data.into_boxed_slice(),
                ep_label: 0,
                in_ep: None,
                in_ep_caplist: None,
            }),
            cv: Condvar::new(),
        })
    }

    #[must_use]
    pub fn label(&self) -> usize {
        self.label
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, BufferInner> {
        self.inner.lock()
    }

    pub(crate) fn cv(&self) -> &Condvar {
        &self.cv
    }

    /// Marks the buffer finished with `result` and signals reply readiness.
    ///
    /// Caller holds the buffer mutex.  If the buffer is a member of a buffer
    /// caplist the buffer is appended to that caplist's ready-queue with a
    /// fresh queue reference and the caplist's waiters are woken; otherwise
    /// the buffer's own condition variable is signalled.
    pub(crate) fn mark_finished(
        &self,
        kobj: &Arc<Kobject>,
        inner: &mut BufferInner,
        result: Result<()>,
    ) {
        inner.state = BufState::Finished;
        inner.wait_result = result;

        // Read the membership under the header lock and release it before
        // taking the caplist mutex; caplist add/del take those two locks in
        // the opposite order.
        let member_of = kobj.lock_header().member_of();
        match member_of.as_ref().and_then(|cl_kobj| cl_kobj.caplist()) {
            Some(cl) => {
                let mut cl_inner = cl.lock();
                cl_inner.queue.push_back(Arc::clone(kobj));
                cl.cv().signal();
            }
            None => self.cv.signal(),
        }
    }
}

impl BufferInner {
    /// Pre-checks a send.
    ///
    /// `inserting` is true when the send also inserts the buffer into a
    /// buffer caplist; `in_caplist` reports whether the buffer is currently a
    /// member of a live caplist.
    pub(crate) fn send_check(&self, inserting: bool, in_caplist: bool) -> Result<()> {
        if self.state == BufState::Finished {
            // Finished buffers must be made ready again by waiting on them.
            return Err(Error::Busy);
        }
        if self.in_ep.is_some() || self.in_ep_caplist.is_some() {
            // Already queueing in an endpoint or an endpoint caplist.
            return Err(Error::Busy);
        }

        debug_assert!(matches!(self.state, BufState::Ready | BufState::Pending));

        if inserting {
            if self.state == BufState::Ready && in_caplist {
                return Err(Error::Busy);
            }
            if self.state == BufState::Pending {
                // A forwarding send cannot re-list the buffer.
                return Err(Error::BadArgument);
            }
        }
        Ok(())
    }

    /// Pre-checks a finish: legal only on a pending, unqueued buffer.
    pub(crate) fn finish_check(&self) -> Result<()> {
        if self.state != BufState::Pending {
            return Err(Error::BadArgument);
        }
        if self.in_ep.is_some() || self.in_ep_caplist.is_some() {
            return Err(Error::Busy);
        }
        Ok(())
    }

    /// Copies `size` bytes from user address `src` into the buffer.
    ///
    /// A zero-length copy leaves `used` untouched.
    pub(crate) fn copy_in(&mut self, space: &AddressSpace, src: usize, size: usize) -> Result<()> {
        if size > self.data.len() {
            return Err(Error::LimitExceeded);
        }
        if size == 0 {
            return Ok(());
        }
        space.copy_from_user(&mut self.data[..size], src)?;
        self.used = size;
        Ok(())
    }

    /// Copies up to `min(size, used)` bytes out to user address `dst`.
    pub(crate) fn copy_out(&self, space: &AddressSpace, dst: usize, size: usize) -> Result<()> {
        let n = size.min(self.used);
        space.copy_to_user(dst, &self.data[..n])
    }
}
