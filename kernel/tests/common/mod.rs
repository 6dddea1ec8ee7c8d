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

#![allow(dead_code)]

use std::mem::size_of;
use std::sync::Arc;

use kernel::{cap, caplist, ipc, Handle, ObjectType, Task};
use status::Result;
use syscall_defs::{BufReceiveInfo, BufWaitInfo, Timeout, TimeoutFlags};

pub const TEST_BUF_SMALL_SIZE: usize = 16;
pub const TEST_BUF_LABEL: usize = 0x1abe1b;
pub const TEST_EP_LABEL: usize = 0x1abe1e;

pub const HELLO: &[u8] = b"Hello world!\0";
pub const BYE: &[u8] = b"Bye\0";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn non_blocking() -> Timeout {
    Timeout::new(0, TimeoutFlags::NON_BLOCKING)
}

pub fn read_handle(task: &Task, uaddr: usize) -> Handle {
    Handle::from_raw(task.space().read_obj_from_user::<u32>(uaddr).unwrap())
}

/// One task with a small buffer, an endpoint, a pre-allocated receive handle
/// and user regions for every transfer direction.
pub struct Fixture {
    pub task: Arc<Task>,
    pub bhandle: Handle,
    pub ehandle: Handle,
    /// Allocated, unpublished handle for receives.
    pub handle: Handle,
    pub send_buf: usize,
    pub recv_buf: usize,
    pub fini_buf: usize,
    pub wait_buf: usize,
    pub recv_info: usize,
    pub wait_info: usize,
    pub scratch: usize,
}

impl Fixture {
    pub fn new() -> Fixture {
        init_logging();
        let task = Task::new();
        let space = task.space();

        let scratch = space.map_anonymous(size_of::<u32>()).unwrap();
        let send_buf = space.map_anonymous(TEST_BUF_SMALL_SIZE).unwrap();
        let recv_buf = space.map_anonymous(TEST_BUF_SMALL_SIZE).unwrap();
        let fini_buf = space.map_anonymous(TEST_BUF_SMALL_SIZE).unwrap();
        let wait_buf = space.map_anonymous(TEST_BUF_SMALL_SIZE).unwrap();
        let recv_info = space.map_anonymous(size_of::<BufReceiveInfo>()).unwrap();
        let wait_info = space.map_anonymous(size_of::<BufWaitInfo>()).unwrap();

        space.copy_to_user(send_buf, HELLO).unwrap();
        space.copy_to_user(fini_buf, BYE).unwrap();

        ipc::buf_alloc(&task, TEST_BUF_SMALL_SIZE, TEST_BUF_LABEL, scratch).unwrap();
        let bhandle = read_handle(&task, scratch);
        assert!(!bhandle.is_nil());

        ipc::ep_create(&task, scratch, TEST_EP_LABEL, Handle::NIL).unwrap();
        let ehandle = read_handle(&task, scratch);
        assert!(!ehandle.is_nil());

        cap::cap_alloc(&task, scratch).unwrap();
        let handle = read_handle(&task, scratch);
        assert!(!handle.is_nil());

        Fixture {
            task,
            bhandle,
            ehandle,
            handle,
            send_buf,
            recv_buf,
            fini_buf,
            wait_buf,
            recv_info,
            wait_info,
            scratch,
        }
    }

    pub fn try_send_with(&self, clhandle: Handle) -> Result<()> {
        ipc::buf_send(
            &self.task,
            self.send_buf,
            HELLO.len(),
            self.bhandle,
            self.ehandle,
            clhandle,
        )
    }

    pub fn send(&self) {
        self.try_send_with(Handle::NIL).unwrap();
    }

    pub fn send_with_cl(&self, clhandle: Handle) {
        self.try_send_with(clhandle).unwrap();
    }

    pub fn try_receive_from(&self, source: Handle, timeout: Timeout) -> Result<()> {
        ipc::buf_receive(
            &self.task,
            self.recv_buf,
            TEST_BUF_SMALL_SIZE,
            self.handle,
            source,
            timeout,
            self.recv_info,
        )
    }

    /// Receives and checks the imprinted label, the sizes and the payload.
    pub fn receive_from(&self, source: Handle) {
        self.try_receive_from(source, Timeout::BLOCKING).unwrap();

        let info: BufReceiveInfo = self
            .task
            .space()
            .read_obj_from_user(self.recv_info)
            .unwrap();
        assert_eq!(info.ep_label, TEST_EP_LABEL);
        assert_eq!(info.used, HELLO.len());
        assert_eq!(info.size, TEST_BUF_SMALL_SIZE);

        let mut payload = vec![0u8; HELLO.len()];
        self.task
            .space()
            .copy_from_user(&mut payload, self.recv_buf)
            .unwrap();
        assert_eq!(payload, HELLO);
    }

    pub fn receive(&self) {
        self.receive_from(self.ehandle);
    }

    pub fn try_finish(&self) -> Result<()> {
        ipc::buf_finish(&self.task, self.fini_buf, BYE.len(), self.handle)
    }

    pub fn finish(&self) {
        self.try_finish().unwrap();
    }

    /// Waits and checks the buffer label, the sizes, the terminal result and
    /// the reply payload.
    pub fn wait_on(&self, handle: Handle, delist: bool) {
        ipc::buf_wait(
            &self.task,
            self.wait_buf,
            TEST_BUF_SMALL_SIZE,
            handle,
            Timeout::BLOCKING,
            delist,
            self.wait_info,
        )
        .unwrap();

        let info: BufWaitInfo = self
            .task
            .space()
            .read_obj_from_user(self.wait_info)
            .unwrap();
        assert_eq!(info.buf_label, TEST_BUF_LABEL);
        assert_eq!(info.used, BYE.len());
        assert_eq!(info.size, TEST_BUF_SMALL_SIZE);
        assert_eq!(info.result, status::OK);

        let mut reply = vec![0u8; BYE.len()];
        self.task
            .space()
            .copy_from_user(&mut reply, self.wait_buf)
            .unwrap();
        assert_eq!(reply, BYE);
    }

    pub fn wait(&self) {
        self.wait_on(self.bhandle, false);
    }

    pub fn create_buf_caplist(&self) -> Handle {
        caplist::create(&self.task, self.scratch, ObjectType::Buffer).unwrap();
        read_handle(&self.task, self.scratch)
    }

    pub fn create_ep_caplist(&self) -> Handle {
        caplist::create(&self.task, self.scratch, ObjectType::Endpoint).unwrap();
        read_handle(&self.task, self.scratch)
    }
}
