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

//! Randomized concurrent workloads.

mod common;

use std::collections::BTreeSet;
use std::mem::size_of;
use std::sync::Arc;
use std::thread;

use common::{init_logging, read_handle};
use kernel::{cap, caplist, ipc, Handle, ObjectType, Task};
use syscall_defs::{BufReceiveInfo, BufWaitInfo, Timeout};

/// Small deterministic generator so failures reproduce.
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> XorShift {
        XorShift(seed | 1)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn fill(&mut self, bytes: &mut [u8]) {
        for chunk in bytes.chunks_mut(8) {
            let word = self.next_u64().to_le_bytes();
            let n = chunk.len();
            chunk.copy_from_slice(&word[..n]);
        }
    }
}

struct UserBuffers {
    data: usize,
    info: usize,
}

fn map_user_buffers(task: &Task, data_len: usize, info_len: usize) -> UserBuffers {
    UserBuffers {
        data: task.space().map_anonymous(data_len).unwrap(),
        info: task.space().map_anonymous(info_len).unwrap(),
    }
}

fn alloc_handle(task: &Task) -> Handle {
    let scratch = task.space().map_anonymous(size_of::<u32>()).unwrap();
    cap::cap_alloc(task, scratch).unwrap();
    read_handle(task, scratch)
}

fn alloc_buffer(task: &Task, size: usize, label: usize) -> Handle {
    let scratch = task.space().map_anonymous(size_of::<u32>()).unwrap();
    ipc::buf_alloc(task, size, label, scratch).unwrap();
    read_handle(task, scratch)
}

fn create_endpoint(task: &Task, label: usize, clhandle: Handle) -> Handle {
    let scratch = task.space().map_anonymous(size_of::<u32>()).unwrap();
    ipc::ep_create(task, scratch, label, clhandle).unwrap();
    read_handle(task, scratch)
}

fn create_caplist(task: &Task, object_type: ObjectType) -> Handle {
    let scratch = task.space().map_anonymous(size_of::<u32>()).unwrap();
    caplist::create(task, scratch, object_type).unwrap();
    read_handle(task, scratch)
}

/// Serves `count` transfers on `source`, replying with every payload byte
/// incremented by one.
fn echo_server(task: &Arc<Task>, source: Handle, buf_size: usize, count: usize) {
    let handle = alloc_handle(task);
    let user = map_user_buffers(task, buf_size, size_of::<BufReceiveInfo>());

    for _ in 0..count {
        ipc::buf_receive(
            task,
            user.data,
            buf_size,
            handle,
            source,
            Timeout::BLOCKING,
            user.info,
        )
        .unwrap();
        let info: BufReceiveInfo = task.space().read_obj_from_user(user.info).unwrap();
        assert!(info.used <= info.size);

        let mut payload = vec![0u8; info.used];
        task.space().copy_from_user(&mut payload, user.data).unwrap();
        for byte in &mut payload {
            *byte = byte.wrapping_add(1);
        }
        task.space().copy_to_user(user.data, &payload).unwrap();

        ipc::buf_finish(task, user.data, payload.len(), handle).unwrap();
    }
}

#[test]
fn fifo_order_is_strict_arrival_order() {
    init_logging();
    let task = Task::new();
    let ep = create_endpoint(&task, 0xf1f0, Handle::NIL);

    const BUFFERS: usize = 8;
    let user = map_user_buffers(&task, 1, size_of::<BufReceiveInfo>());
    for i in 0..BUFFERS {
        let bhandle = alloc_buffer(&task, 1, 100 + i);
        task.space().copy_to_user(user.data, &[i as u8]).unwrap();
        ipc::buf_send(&task, user.data, 1, bhandle, ep, Handle::NIL).unwrap();
    }

    let handle = alloc_handle(&task);
    for i in 0..BUFFERS {
        ipc::buf_receive(
            &task,
            user.data,
            1,
            handle,
            ep,
            Timeout::BLOCKING,
            user.info,
        )
        .unwrap();
        let mut byte = [0u8; 1];
        task.space().copy_from_user(&mut byte, user.data).unwrap();
        assert_eq!(byte[0] as usize, i);
        ipc::buf_finish(&task, user.data, 0, handle).unwrap();
    }
}

#[test]
fn concurrent_echo_round_trips_preserve_payloads() {
    init_logging();
    const CLIENTS: usize = 4;
    const ITERS: usize = 64;
    const BUF_SIZE: usize = 32;

    let task = Task::new();
    let ep = create_endpoint(&task, 0xec40, Handle::NIL);

    let server = {
        let task = Arc::clone(&task);
        thread::spawn(move || echo_server(&task, ep, BUF_SIZE, CLIENTS * ITERS))
    };

    let clients: Vec<_> = (0..CLIENTS)
        .map(|client| {
            let task = Arc::clone(&task);
            thread::spawn(move || {
                let mut rng = XorShift::new(0x5eed + client as u64);
                let bhandle = alloc_buffer(&task, BUF_SIZE, client);
                let user = map_user_buffers(&task, BUF_SIZE, size_of::<BufWaitInfo>());

                for _ in 0..ITERS {
                    let len = 1 + (rng.next_u64() as usize) % BUF_SIZE;
                    let mut payload = vec![0u8; len];
                    rng.fill(&mut payload);
                    task.space().copy_to_user(user.data, &payload).unwrap();

                    ipc::buf_send(&task, user.data, len, bhandle, ep, Handle::NIL).unwrap();
                    ipc::buf_wait(
                        &task,
                        user.data,
                        BUF_SIZE,
                        bhandle,
                        Timeout::BLOCKING,
                        false,
                        user.info,
                    )
                    .unwrap();

                    let info: BufWaitInfo = task.space().read_obj_from_user(user.info).unwrap();
                    assert_eq!(info.result, status::OK);
                    assert_eq!(info.used, len);
                    assert_eq!(info.buf_label, client);

                    let mut reply = vec![0u8; len];
                    task.space().copy_from_user(&mut reply, user.data).unwrap();
                    for (reply_byte, sent_byte) in reply.iter().zip(&payload) {
                        assert_eq!(*reply_byte, sent_byte.wrapping_add(1));
                    }
                }
            })
        })
        .collect();

    for client in clients {
        client.join().unwrap();
    }
    server.join().unwrap();
}

#[test]
fn wait_any_returns_every_outstanding_reply() {
    init_logging();
    const BUFFERS: usize = 4;
    const ITERS: usize = 32;
    const BUF_SIZE: usize = 16;

    let task = Task::new();
    let ep = create_endpoint(&task, 0x3a17, Handle::NIL);
    let cl = create_caplist(&task, ObjectType::Buffer);

    let server = {
        let task = Arc::clone(&task);
        thread::spawn(move || echo_server(&task, ep, BUF_SIZE, BUFFERS * ITERS))
    };

    let handles: Vec<Handle> = (0..BUFFERS)
        .map(|i| alloc_buffer(&task, BUF_SIZE, 100 + i))
        .collect();
    let user = map_user_buffers(&task, BUF_SIZE, size_of::<BufWaitInfo>());

    for iter in 0..ITERS {
        for (i, &bhandle) in handles.iter().enumerate() {
            task.space()
                .copy_to_user(user.data, &[iter as u8, i as u8])
                .unwrap();
            ipc::buf_send(&task, user.data, 2, bhandle, ep, cl).unwrap();
        }

        let mut labels = BTreeSet::new();
        for _ in 0..BUFFERS {
            ipc::buf_wait(
                &task,
                user.data,
                BUF_SIZE,
                cl,
                Timeout::BLOCKING,
                true,
                user.info,
            )
            .unwrap();
            let info: BufWaitInfo = task.space().read_obj_from_user(user.info).unwrap();
            assert_eq!(info.result, status::OK);
            assert_eq!(info.used, 2);
            labels.insert(info.buf_label);
        }
        let expected: BTreeSet<usize> = (100..100 + BUFFERS).collect();
        assert_eq!(labels, expected);
    }

    server.join().unwrap();
}

#[test]
fn receive_any_serves_the_whole_endpoint_group() {
    init_logging();
    const ENDPOINTS: usize = 3;
    const ITERS: usize = 16;
    const BUF_SIZE: usize = 8;

    let task = Task::new();
    let ce = create_caplist(&task, ObjectType::Endpoint);
    let eps: Vec<Handle> = (0..ENDPOINTS)
        .map(|i| create_endpoint(&task, 0xe0 + i, ce))
        .collect();

    let senders: Vec<_> = eps
        .iter()
        .enumerate()
        .map(|(i, &ep)| {
            let task = Arc::clone(&task);
            thread::spawn(move || {
                let bhandle = alloc_buffer(&task, BUF_SIZE, i);
                let user = map_user_buffers(&task, BUF_SIZE, size_of::<BufWaitInfo>());
                for _ in 0..ITERS {
                    task.space().copy_to_user(user.data, &[i as u8]).unwrap();
                    ipc::buf_send(&task, user.data, 1, bhandle, ep, Handle::NIL).unwrap();
                    ipc::buf_wait(
                        &task,
                        user.data,
                        BUF_SIZE,
                        bhandle,
                        Timeout::BLOCKING,
                        false,
                        user.info,
                    )
                    .unwrap();
                    let info: BufWaitInfo = task.space().read_obj_from_user(user.info).unwrap();
                    assert_eq!(info.result, status::OK);
                }
            })
        })
        .collect();

    let handle = alloc_handle(&task);
    let user = map_user_buffers(&task, BUF_SIZE, size_of::<BufReceiveInfo>());
    for _ in 0..ENDPOINTS * ITERS {
        ipc::buf_receive(
            &task,
            user.data,
            BUF_SIZE,
            handle,
            ce,
            Timeout::BLOCKING,
            user.info,
        )
        .unwrap();
        let info: BufReceiveInfo = task.space().read_obj_from_user(user.info).unwrap();
        assert!((0xe0..0xe0 + ENDPOINTS).contains(&info.ep_label));
        ipc::buf_finish(&task, user.data, 1, handle).unwrap();
    }

    for sender in senders {
        sender.join().unwrap();
    }
}
