//! Resource records and the mutex-guarded assignment table.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{CoordinatorError, WorkerId};

/// Resource identifier.
pub type ResourceId = u32;

/// One unit of the shared pool.
///
/// The in-use flag is derived from the holder, so a free resource can never
/// report a holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResourceId,
    held_by: Option<WorkerId>,
}

impl Resource {
    /// Create a free resource.
    #[must_use]
    pub const fn new(id: ResourceId) -> Self {
        Self { id, held_by: None }
    }

    /// Resource identifier.
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// Whether a worker currently holds this resource.
    #[must_use]
    pub const fn in_use(&self) -> bool {
        self.held_by.is_some()
    }

    /// Current holder, if any.
    #[must_use]
    pub const fn held_by(&self) -> Option<WorkerId> {
        self.held_by
    }

    /// Point-in-time copy for observers.
    #[must_use]
    pub const fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            id: self.id,
            in_use: self.in_use(),
            held_by: self.held_by,
        }
    }
}

/// Observer view of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Resource identifier.
    pub id: ResourceId,
    /// Whether the resource is held.
    pub in_use: bool,
    /// Holder, if any.
    pub held_by: Option<WorkerId>,
}

/// Fixed resource collection with serialized scan-and-mark.
#[derive(Debug)]
pub struct ResourceTable {
    slots: Mutex<Vec<Resource>>,
}

impl ResourceTable {
    /// Build a table from resources created at pool initialization.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::DuplicateResource`] if two resources share an id.
    pub fn new(resources: Vec<Resource>) -> Result<Self, CoordinatorError> {
        let mut seen = HashSet::with_capacity(resources.len());
        for resource in &resources {
            if !seen.insert(resource.id) {
                return Err(CoordinatorError::DuplicateResource(resource.id));
            }
        }
        // Supplied records start free regardless of how they were built.
        let slots = resources.into_iter().map(|r| Resource::new(r.id)).collect();
        Ok(Self {
            slots: Mutex::new(slots),
        })
    }

    /// Claim the first free resource for `worker`.
    ///
    /// Returns `None` if nothing is free or the worker already holds a
    /// resource. Under correct gate sizing neither can happen once a permit
    /// has been granted.
    pub fn claim(self: &Arc<Self>, worker: WorkerId) -> Option<ResourceLease> {
        let mut slots = self.slots.lock();
        if slots.iter().any(|r| r.held_by == Some(worker)) {
            return None;
        }
        let slot = slots.iter_mut().find(|r| !r.in_use())?;
        slot.held_by = Some(worker);
        Some(ResourceLease {
            table: Arc::clone(self),
            resource: slot.id,
            worker,
            released: false,
        })
    }

    /// Mark a resource free. Returns whether it was held.
    pub fn release(&self, id: ResourceId) -> bool {
        let mut slots = self.slots.lock();
        slots
            .iter_mut()
            .find(|r| r.id == id)
            .and_then(|r| r.held_by.take())
            .is_some()
    }

    /// Snapshot of every resource in table order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ResourceSnapshot> {
        self.slots.lock().iter().map(Resource::snapshot).collect()
    }

    /// Number of resources currently held.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.slots.lock().iter().filter(|r| r.in_use()).count()
    }

    /// Resource held by `worker`, if any.
    #[must_use]
    pub fn holder_of(&self, worker: WorkerId) -> Option<ResourceId> {
        self.slots
            .lock()
            .iter()
            .find(|r| r.held_by == Some(worker))
            .map(Resource::id)
    }

    /// Number of resources in the table.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Scoped hold on a resource.
///
/// The resource is released when the lease is dropped, whether the holder
/// finished normally, returned early, or was aborted.
#[derive(Debug)]
pub struct ResourceLease {
    table: Arc<ResourceTable>,
    resource: ResourceId,
    worker: WorkerId,
    released: bool,
}

impl ResourceLease {
    /// Leased resource.
    #[must_use]
    pub const fn resource(&self) -> ResourceId {
        self.resource
    }

    /// Holder of the lease.
    #[must_use]
    pub const fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Release the resource now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.table.release(self.resource);
        }
    }
}

impl Drop for ResourceLease {
    fn drop(&mut self) {
        self.release_inner();
    }
}
