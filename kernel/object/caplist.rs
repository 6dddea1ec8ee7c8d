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

use std::collections::VecDeque;
use std::sync::Arc;

use status::{Error, Result};

use crate::cap::Handle;
use crate::object::{Kobject, KobjectHeader, ObjectType};
use crate::sync::{Condvar, Mutex, MutexGuard};
use crate::task::Task;

/// A capability list: a typed set of kernel objects plus a ready-queue.
///
/// The member type is immutable after creation; all members share it.  The
/// single mutex guards both the member set and the ready-queue, and the
/// condition variable belongs to the ready-queue.
pub struct Caplist {
    object_type: ObjectType,
    inner: Mutex<CaplistInner>,
    cv: Condvar,
}

pub(crate) struct CaplistInner {
    /// Member kernel objects; each entry holds one strong reference.
    pub members: Vec<Arc<Kobject>>,
    /// Ready-queue: pending buffers steered from member endpoints, or
    /// finished member buffers, depending on the member type.
    pub queue: VecDeque<Arc<Kobject>>,
}

impl Caplist {
    #[must_use]
    pub fn new(object_type: ObjectType) -> Caplist {
        Self {
            object_type,
            inner: Mutex::new(CaplistInner {
                members: Vec::new(),
                queue: VecDeque::new(),
            }),
            cv: Condvar::new(),
        }
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, CaplistInner> {
        self.inner.lock()
    }

    pub(crate) fn cv(&self) -> &Condvar {
        &self.cv
    }
}

/// Adds `obj` to the caplist behind `cl_kobj`.
///
/// Caller holds the caplist mutex and the object's header lock, in that
/// order.  A membership whose caplist has been destroyed counts as absent
/// and may be overwritten.
pub(crate) fn add_locked(
    cl_kobj: &Arc<Kobject>,
    cl_inner: &mut CaplistInner,
    obj: &Arc<Kobject>,
    header: &mut KobjectHeader,
) -> Result<()> {
    if header.member_of().is_some() {
        return Err(Error::Busy);
    }
    header.in_caplist = Some(Arc::downgrade(cl_kobj));
    cl_inner.members.push(Arc::clone(obj));
    Ok(())
}

/// Removes `obj` from the caplist behind `cl_kobj`.
///
/// Caller holds the caplist mutex and the object's header lock, in that
/// order.  Fails with `NotFound` if the object is not a member of this
/// caplist.
pub(crate) fn del_locked(
    cl_kobj: &Arc<Kobject>,
    cl_inner: &mut CaplistInner,
    obj: &Arc<Kobject>,
    header: &mut KobjectHeader,
) -> Result<()> {
    let is_member = header
        .in_caplist
        .as_ref()
        .is_some_and(|weak| core::ptr::eq(weak.as_ptr(), Arc::as_ptr(cl_kobj)));
    if !is_member {
        return Err(Error::NotFound);
    }
    header.in_caplist = None;
    cl_inner.members.retain(|member| !Arc::ptr_eq(member, obj));
    Ok(())
}

/// Creates a caplist for objects of `object_type` and publishes it under a
/// freshly allocated handle written to `cl_uaddr`.
pub fn create(task: &Task, cl_uaddr: usize, object_type: ObjectType) -> Result<()> {
    if !matches!(object_type, ObjectType::Buffer | ObjectType::Endpoint) {
        return Err(Error::BadArgument);
    }

    let handle = task.caps().alloc()?;
    if let Err(e) = task.space().copy_obj_to_user(cl_uaddr, &handle.raw()) {
        let _ = task.caps().free(handle);
        return Err(e);
    }

    let kobj = Kobject::new_caplist(Caplist::new(object_type));
    if let Err(e) = task.caps().publish(handle, &kobj) {
        let _ = task.caps().free(handle);
        return Err(e);
    }
    Ok(())
}

/// Destroys the caplist referred to by `clhandle`.
///
/// Members are untouched; the storage goes away with the last reference.
pub fn destroy(task: &Task, clhandle: Handle) -> Result<()> {
    task.caps()
        .unpublish(clhandle, ObjectType::Caplist)
        .ok_or(Error::NotFound)?;
    task.caps().free(clhandle)
}

/// Adds the object referred to by `handle` to the caplist referred to by
/// `clhandle`.
///
/// The member is resolved with the caplist's type tag, so a wrong-typed
/// handle fails with `NotFound`.
pub fn add(task: &Task, clhandle: Handle, handle: Handle) -> Result<()> {
    let cl_kobj = task
        .caps()
        .get(clhandle, ObjectType::Caplist)
        .ok_or(Error::NotFound)?;
    let cl = cl_kobj.caplist().ok_or(Error::NotFound)?;
    let obj = task
        .caps()
        .get(handle, cl.object_type())
        .ok_or(Error::NotFound)?;

    let mut cl_inner = cl.lock();
    let mut header = obj.lock_header();
    add_locked(&cl_kobj, &mut cl_inner, &obj, &mut header)
}

/// Removes the object referred to by `handle` from the caplist referred to
/// by `clhandle`.
pub fn del(task: &Task, clhandle: Handle, handle: Handle) -> Result<()> {
    let cl_kobj = task
        .caps()
        .get(clhandle, ObjectType::Caplist)
        .ok_or(Error::NotFound)?;
    let cl = cl_kobj.caplist().ok_or(Error::NotFound)?;
    let obj = task
        .caps()
        .get(handle, cl.object_type())
        .ok_or(Error::NotFound)?;

    let mut cl_inner = cl.lock();
    let mut header = obj.lock_header();
    del_locked(&cl_kobj, &mut cl_inner, &obj, &mut header)
}
