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

//! Buffer transfer operations.
//!
//! The lock order, of which every operation takes a contiguous prefix and
//! which it releases in reverse, is:
//!
//! ```text
//! endpoint mutex → endpoint header lock → endpoint-caplist mutex
//!               → buffer mutex → buffer-caplist mutex → buffer header lock
//! ```

use std::sync::Arc;

use status::{Error, Result, StatusCode};
use syscall_defs::{BufReceiveInfo, BufWaitInfo, Timeout};

use crate::cap::Handle;
use crate::object::buffer::{BufState, Buffer, BufferInner};
use crate::object::caplist;
use crate::object::endpoint::Endpoint;
use crate::object::{Kobject, ObjectType, Payload};
use crate::sync::Sleep;
use crate::task::Task;

/// Allocates an IPC buffer of `size` bytes with the user-defined `label` and
/// publishes it under a freshly allocated handle written to `bhandle_uaddr`.
pub fn buf_alloc(task: &Task, size: usize, label: usize, bhandle_uaddr: usize) -> Result<()> {
    let handle = task.caps().alloc()?;
    if let Err(e) = task.space().copy_obj_to_user(bhandle_uaddr, &handle.raw()) {
        let _ = task.caps().free(handle);
        return Err(e);
    }

    let buffer = match Buffer::alloc(size, label) {
        Ok(buffer) => buffer,
        Err(e) => {
            let _ = task.caps().free(handle);
            return Err(e);
        }
    };

    let kobj = Kobject::new_buffer(buffer);
    if let Err(e) = task.caps().publish(handle, &kobj) {
        let _ = task.caps().free(handle);
        return Err(e);
    }
    Ok(())
}

/// Frees the IPC buffer referred to by `bhandle`.
pub fn buf_free(task: &Task, bhandle: Handle) -> Result<()> {
    task.caps()
        .unpublish(bhandle, ObjectType::Buffer)
        .ok_or(Error::NotFound)?;
    task.caps().free(bhandle)
}

/// Creates an IPC endpoint with the user-defined `label` and publishes it
/// under a freshly allocated handle written to `ehandle_uaddr`.
///
/// If `clhandle` is not nil the endpoint is added to that caplist as part of
/// creation; a failing add rolls the creation back.
pub fn ep_create(task: &Task, ehandle_uaddr: usize, label: usize, clhandle: Handle) -> Result<()> {
    let handle = task.caps().alloc()?;
    if let Err(e) = task.space().copy_obj_to_user(ehandle_uaddr, &handle.raw()) {
        let _ = task.caps().free(handle);
        return Err(e);
    }

    let kobj = Kobject::new_endpoint(Endpoint::new(label));
    if let Err(e) = task.caps().publish(handle, &kobj) {
        let _ = task.caps().free(handle);
        return Err(e);
    }

    if !clhandle.is_nil() {
        if let Err(e) = caplist::add(task, clhandle, handle) {
            let _ = ep_destroy(task, handle);
            return Err(e);
        }
    }
    Ok(())
}

/// Destroys the IPC endpoint referred to by `ehandle`.
///
/// Outstanding queued buffers stay valid; the queue linkages keep their own
/// references and are drained or dropped with the endpoint's storage.
pub fn ep_destroy(task: &Task, ehandle: Handle) -> Result<()> {
    task.caps()
        .unpublish(ehandle, ObjectType::Endpoint)
        .ok_or(Error::NotFound)?;
    task.caps().free(ehandle)
}

/// Unpublishes the temporary capability consumed by a forwarding send or a
/// finish.
///
/// The user task may have tampered with the handle in the meantime; a stale
/// handle is tolerated and simply ignored.
fn unpublish_temp_cap(task: &Task, bhandle: Handle) {
    let _ = task.caps().unpublish(bhandle, ObjectType::Buffer);
}

/// Sends the buffer referred to by `bhandle` to the endpoint referred to by
/// `ehandle`, copying `size` bytes from user address `src` into it first.
///
/// If `clhandle` is not nil and the buffer is ready, the buffer is also
/// inserted into that buffer caplist, enabling wait-any on the reply.  A
/// send on a pending buffer is a forwarding send: it re-enqueues the buffer
/// and consumes the temporary capability obtained from the receive.
///
/// The buffer lands in the endpoint-caplist ready-queue when the endpoint is
/// a member of one, otherwise in the endpoint's own queue; the corresponding
/// condition variable is signalled while the queue's lock is held.
pub fn buf_send(
    task: &Task,
    src: usize,
    size: usize,
    bhandle: Handle,
    ehandle: Handle,
    clhandle: Handle,
) -> Result<()> {
    let buf_kobj = task
        .caps()
        .get(bhandle, ObjectType::Buffer)
        .ok_or(Error::NotFound)?;
    let buf = buf_kobj.buffer().ok_or(Error::NotFound)?;

    let ep_kobj = task
        .caps()
        .get(ehandle, ObjectType::Endpoint)
        .ok_or(Error::NotFound)?;
    let ep = ep_kobj.endpoint().ok_or(Error::NotFound)?;

    let ins_kobj = if clhandle.is_nil() {
        None
    } else {
        Some(
            task.caps()
                .get(clhandle, ObjectType::Caplist)
                .ok_or(Error::NotFound)?,
        )
    };
    let ins_cl = match ins_kobj.as_ref() {
        Some(kobj) => {
            let cl = kobj.caplist().ok_or(Error::NotFound)?;
            if cl.object_type() != ObjectType::Buffer {
                return Err(Error::BadArgument);
            }
            Some(cl)
        }
        None => None,
    };

    // Lock everything in the locking order.
    let mut ep_queue = ep.lock();
    let ep_header = ep_kobj.lock_header();
    let ep_cl_kobj = ep_header.member_of();
    let ep_cl = ep_cl_kobj.as_ref().and_then(|kobj| kobj.caplist());
    let mut ep_cl_inner = ep_cl.map(caplist::Caplist::lock);
    let mut inner = buf.lock();
    let mut ins_cl_inner = ins_cl.map(caplist::Caplist::lock);
    let mut header = buf_kobj.lock_header();

    inner.send_check(ins_cl.is_some(), header.member_of().is_some())?;
    inner.copy_in(task.space(), src, size)?;

    if let (Some(ins_kobj), Some(ins_cl_inner)) = (ins_kobj.as_ref(), ins_cl_inner.as_mut()) {
        // Membership was pre-checked in send_check(); the add cannot fail.
        let rc = caplist::add_locked(ins_kobj, ins_cl_inner, &buf_kobj, &mut header);
        debug_assert!(rc.is_ok());
    }

    if inner.state == BufState::Pending {
        unpublish_temp_cap(task, bhandle);
    }

    inner.state = BufState::Pending;
    // Imprint the endpoint's label on the buffer.
    inner.ep_label = ep.label();

    match (ep_cl_kobj.as_ref(), ep_cl, ep_cl_inner.as_mut()) {
        (Some(cl_kobj), Some(cl), Some(cl_inner)) => {
            cl_inner.queue.push_back(Arc::clone(&buf_kobj));
            inner.in_ep_caplist = Some(Arc::downgrade(cl_kobj));
            cl.cv().signal();
        }
        _ => {
            ep_queue.push_back(Arc::clone(&buf_kobj));
            inner.in_ep = Some(Arc::downgrade(&ep_kobj));
            ep.cv().signal();
        }
    }
    Ok(())
}

/// Receives a buffer from the endpoint or endpoint caplist referred to by
/// `ehandle`, copying up to `size` bytes of payload out to user address
/// `dst`.
///
/// `bhandle` must be an allocated, unpublished handle; on success the buffer
/// is published under it for the receiver's reply and the receive info
/// structure is written to `info_uaddr`.  A failure after the dequeue (a
/// copy-out fault or a publish failure) finishes the buffer with that error,
/// so the original sender observes it through its own wait.
pub fn buf_receive(
    task: &Task,
    dst: usize,
    size: usize,
    bhandle: Handle,
    ehandle: Handle,
    timeout: Timeout,
    info_uaddr: usize,
) -> Result<()> {
    let mut sleep = Sleep::new(timeout.interruptible(), task.waits());

    let kobj = task.caps().get_any(ehandle).ok_or(Error::NotFound)?;
    let buf_kobj = match kobj.payload() {
        Payload::Endpoint(ep) => {
            let mut queue = ep.lock();
            loop {
                if let Some(buf_kobj) = queue.pop_front() {
                    break buf_kobj;
                }
                let (reacquired, rc) = ep.cv().wait(queue, &mut sleep);
                queue = reacquired;
                rc?;
            }
        }
        Payload::Caplist(cl) => {
            if cl.object_type() != ObjectType::Endpoint {
                return Err(Error::BadArgument);
            }
            let mut cl_inner = cl.lock();
            loop {
                if let Some(buf_kobj) = cl_inner.queue.pop_front() {
                    break buf_kobj;
                }
                let (reacquired, rc) = cl.cv().wait(cl_inner, &mut sleep);
                cl_inner = reacquired;
                rc?;
            }
        }
        Payload::Buffer(_) => return Err(Error::NotFound),
    };

    let buf = buf_kobj.buffer().ok_or(Error::NotFound)?;
    let mut inner = buf.lock();
    inner.in_ep = None;
    inner.in_ep_caplist = None;

    let rc = receive_copy_out(task, buf, &inner, dst, size, info_uaddr)
        .and_then(|()| task.caps().publish(bhandle, &buf_kobj));
    if let Err(e) = rc {
        // The sender observes the failure as the terminal result of its wait.
        buf.mark_finished(&buf_kobj, &mut inner, Err(e));
        return Err(e);
    }
    Ok(())
}

fn receive_copy_out(
    task: &Task,
    buf: &Buffer,
    inner: &BufferInner,
    dst: usize,
    size: usize,
    info_uaddr: usize,
) -> Result<()> {
    inner.copy_out(task.space(), dst, size)?;
    let info = BufReceiveInfo {
        ep_label: inner.ep_label,
        used: inner.used,
        size: buf.size(),
    };
    task.space().copy_obj_to_user(info_uaddr, &info)
}

/// Finishes the pending buffer referred to by `bhandle`, copying `size`
/// reply bytes from user address `src` into it.
///
/// The temporary capability obtained from the receive is consumed.  If the
/// buffer is a member of a buffer caplist the reply is announced through the
/// caplist's ready-queue, otherwise through the buffer's own condition
/// variable.
pub fn buf_finish(task: &Task, src: usize, size: usize, bhandle: Handle) -> Result<()> {
    let buf_kobj = task
        .caps()
        .get(bhandle, ObjectType::Buffer)
        .ok_or(Error::NotFound)?;
    let buf = buf_kobj.buffer().ok_or(Error::NotFound)?;

    let mut inner = buf.lock();
    inner.finish_check()?;
    inner.copy_in(task.space(), src, size)?;

    unpublish_temp_cap(task, bhandle);
    buf.mark_finished(&buf_kobj, &mut inner, Ok(()));
    Ok(())
}

/// Waits for the buffer referred to by `handle` (or, for a buffer caplist,
/// for any member) to be finished, then recycles it to ready and copies up
/// to `size` reply bytes out to user address `dst`.
///
/// For a caplist wait, `delist` additionally removes the returned buffer
/// from the caplist's member set, so the next send may insert it into the
/// same, a different, or no caplist at all.
pub fn buf_wait(
    task: &Task,
    dst: usize,
    size: usize,
    handle: Handle,
    timeout: Timeout,
    delist: bool,
    info_uaddr: usize,
) -> Result<()> {
    let mut sleep = Sleep::new(timeout.interruptible(), task.waits());

    let kobj = task.caps().get_any(handle).ok_or(Error::NotFound)?;
    match kobj.payload() {
        Payload::Buffer(buf) => {
            let mut inner = buf.lock();
            while inner.state != BufState::Finished {
                let (reacquired, rc) = buf.cv().wait(inner, &mut sleep);
                inner = reacquired;
                rc?;
            }
            wait_finish(task, buf, &mut inner, dst, size, info_uaddr)
        }
        Payload::Caplist(cl) => {
            if cl.object_type() != ObjectType::Buffer {
                return Err(Error::BadArgument);
            }

            let buf_kobj = {
                let mut cl_inner = cl.lock();
                let buf_kobj = loop {
                    if let Some(buf_kobj) = cl_inner.queue.pop_front() {
                        break buf_kobj;
                    }
                    let (reacquired, rc) = cl.cv().wait(cl_inner, &mut sleep);
                    cl_inner = reacquired;
                    rc?;
                };
                if delist {
                    // Delist so the buffer can go into the same, a different,
                    // or no caplist at all during the next send.  A user
                    // racing the membership from another thread loses it;
                    // the wait itself still succeeds.
                    let mut header = buf_kobj.lock_header();
                    let _ = caplist::del_locked(&kobj, &mut cl_inner, &buf_kobj, &mut header);
                }
                buf_kobj
            };

            let buf = buf_kobj.buffer().ok_or(Error::NotFound)?;
            let mut inner = buf.lock();
            debug_assert_eq!(inner.state, BufState::Finished);
            wait_finish(task, buf, &mut inner, dst, size, info_uaddr)
        }
        Payload::Endpoint(_) => Err(Error::NotFound),
    }
}

fn wait_finish(
    task: &Task,
    buf: &Buffer,
    inner: &mut BufferInner,
    dst: usize,
    size: usize,
    info_uaddr: usize,
) -> Result<()> {
    inner.state = BufState::Ready;

    inner.copy_out(task.space(), dst, size)?;
    let info = BufWaitInfo {
        buf_label: buf.label(),
        used: inner.used,
        size: buf.size(),
        result: inner.wait_result.status_code(),
        _reserved: 0,
    };
    task.space().copy_obj_to_user(info_uaddr, &info)
}
