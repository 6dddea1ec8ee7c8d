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

//! The raw syscall surface: argument marshaling and dispatch.
//!
//! Every entry resolves its handles with a type check, performs the operation
//! contract and reports a numeric status; no error unwinds past this
//! boundary.

use log_if::debug_if;
use status::{Error, Result};
use syscall_defs::{SysCallId, SysCallReturnValue, Timeout};

use crate::cap::{self, Handle};
use crate::ipc;
use crate::object::{caplist, ObjectType};
use crate::task::Task;

const SYSCALL_DEBUG: bool = false;

/// A stream of word-sized syscall arguments.
///
/// Handlers pull their arguments off the front in declaration order; running
/// off the end of the words the caller supplied is a `BadArgument`.
pub struct SyscallArgs<'a> {
    words: &'a [usize],
    next: usize,
}

impl<'a> SyscallArgs<'a> {
    #[must_use]
    pub fn new(words: &'a [usize]) -> Self {
        Self { words, next: 0 }
    }

    pub fn next_usize(&mut self) -> Result<usize> {
        let word = self
            .words
            .get(self.next)
            .copied()
            .ok_or(Error::BadArgument)?;
        self.next += 1;
        Ok(word)
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        u32::try_from(self.next_usize()?).map_err(|_| Error::BadArgument)
    }

    pub fn next_u64(&mut self) -> Result<u64> {
        self.next_usize().map(|word| word as u64)
    }

    pub fn next_handle(&mut self) -> Result<Handle> {
        self.next_u32().map(Handle::from_raw)
    }

    pub fn next_timeout(&mut self) -> Result<Timeout> {
        self.next_u64().map(Timeout::from_raw)
    }

    pub fn next_bool(&mut self) -> Result<bool> {
        self.next_usize().map(|word| word != 0)
    }
}

fn handle_cap_alloc(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let handle_uaddr = args.next_usize()?;
    cap::cap_alloc(task, handle_uaddr).map(|()| 0)
}

fn handle_cap_free(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let handle = args.next_handle()?;
    cap::cap_free(task, handle).map(|()| 0)
}

fn handle_caplist_create(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let cl_uaddr = args.next_usize()?;
    let raw_type = args.next_u32()?;
    let object_type = ObjectType::from_raw(raw_type).ok_or(Error::BadArgument)?;
    caplist::create(task, cl_uaddr, object_type).map(|()| 0)
}

fn handle_caplist_destroy(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let clhandle = args.next_handle()?;
    caplist::destroy(task, clhandle).map(|()| 0)
}

fn handle_caplist_add(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let clhandle = args.next_handle()?;
    let handle = args.next_handle()?;
    caplist::add(task, clhandle, handle).map(|()| 0)
}

fn handle_caplist_del(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let clhandle = args.next_handle()?;
    let handle = args.next_handle()?;
    caplist::del(task, clhandle, handle).map(|()| 0)
}

fn handle_ep_create(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let ehandle_uaddr = args.next_usize()?;
    let label = args.next_usize()?;
    let clhandle = args.next_handle()?;
    ipc::ep_create(task, ehandle_uaddr, label, clhandle).map(|()| 0)
}

fn handle_ep_destroy(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let ehandle = args.next_handle()?;
    ipc::ep_destroy(task, ehandle).map(|()| 0)
}

fn handle_buf_alloc(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let size = args.next_usize()?;
    let label = args.next_usize()?;
    let bhandle_uaddr = args.next_usize()?;
    ipc::buf_alloc(task, size, label, bhandle_uaddr).map(|()| 0)
}

fn handle_buf_free(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let bhandle = args.next_handle()?;
    ipc::buf_free(task, bhandle).map(|()| 0)
}

fn handle_buf_send(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let src = args.next_usize()?;
    let size = args.next_usize()?;
    let bhandle = args.next_handle()?;
    let ehandle = args.next_handle()?;
    let clhandle = args.next_handle()?;
    ipc::buf_send(task, src, size, bhandle, ehandle, clhandle).map(|()| 0)
}

fn handle_buf_receive(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let dst = args.next_usize()?;
    let size = args.next_usize()?;
    let bhandle = args.next_handle()?;
    let ehandle = args.next_handle()?;
    let timeout = args.next_timeout()?;
    let info_uaddr = args.next_usize()?;
    ipc::buf_receive(task, dst, size, bhandle, ehandle, timeout, info_uaddr).map(|()| 0)
}

fn handle_buf_finish(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let src = args.next_usize()?;
    let size = args.next_usize()?;
    let bhandle = args.next_handle()?;
    ipc::buf_finish(task, src, size, bhandle).map(|()| 0)
}

fn handle_buf_wait(task: &Task, args: &mut SyscallArgs) -> Result<u64> {
    let dst = args.next_usize()?;
    let size = args.next_usize()?;
    let handle = args.next_handle()?;
    let timeout = args.next_timeout()?;
    let delist = args.next_bool()?;
    let info_uaddr = args.next_usize()?;
    ipc::buf_wait(task, dst, size, handle, timeout, delist, info_uaddr).map(|()| 0)
}

pub fn handle_syscall(task: &Task, id: u16, args: &mut SyscallArgs) -> Result<u64> {
    debug_if!(SYSCALL_DEBUG, "syscall: {:#06x}", id);

    let id = SysCallId::try_from(id)?;
    let res = match id {
        SysCallId::CapAlloc => handle_cap_alloc(task, args),
        SysCallId::CapFree => handle_cap_free(task, args),
        SysCallId::CaplistCreate => handle_caplist_create(task, args),
        SysCallId::CaplistDestroy => handle_caplist_destroy(task, args),
        SysCallId::CaplistAdd => handle_caplist_add(task, args),
        SysCallId::CaplistDel => handle_caplist_del(task, args),
        SysCallId::EpCreate => handle_ep_create(task, args),
        SysCallId::EpDestroy => handle_ep_destroy(task, args),
        SysCallId::BufAlloc => handle_buf_alloc(task, args),
        SysCallId::BufFree => handle_buf_free(task, args),
        SysCallId::BufSend => handle_buf_send(task, args),
        SysCallId::BufReceive => handle_buf_receive(task, args),
        SysCallId::BufFinish => handle_buf_finish(task, args),
        SysCallId::BufWait => handle_buf_wait(task, args),
    };

    debug_if!(SYSCALL_DEBUG, "syscall: {:?} -> {:?}", id, res);
    res
}

#[must_use]
pub fn raw_handle_syscall(task: &Task, id: u16, args: &mut SyscallArgs) -> i64 {
    let ret_val: SysCallReturnValue = handle_syscall(task, id, args).into();
    ret_val.0
}
