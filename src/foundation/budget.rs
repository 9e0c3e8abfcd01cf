use crate::foundation::error::{PanoError, PanoResult};
use std::cell::Cell;
use std::rc::Rc;

/// Memory accounting for allocations proportional to image area.
///
/// Buffers proportional to a single row are considered insignificant and are
/// not accounted. The budget is shared by `Rc` between the components that
/// reserve from it; it is not `Sync` and the pipeline never crosses threads.
#[derive(Debug)]
pub struct MemoryBudget {
    limit: Cell<u64>,
    usage: Cell<u64>,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self {
            limit: Cell::new(u64::MAX),
            usage: Cell::new(0),
        }
    }
}

impl MemoryBudget {
    /// Create an effectively unbounded budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a budget with the given limit in bytes.
    pub fn with_limit(limit: u64) -> Self {
        let budget = Self::default();
        budget.set_limit(limit);
        budget
    }

    /// Set the limit in bytes. Intended to be called once, before any reservation.
    pub fn set_limit(&self, limit: u64) {
        self.limit.set(limit);
    }

    /// The configured limit in bytes.
    pub fn limit(&self) -> u64 {
        self.limit.get()
    }

    /// Currently accounted usage in bytes.
    pub fn usage(&self) -> u64 {
        self.usage.get()
    }

    /// Reserve the product of `dims` bytes.
    ///
    /// Fails without changing the usage if the product overflows, if adding it
    /// to the usage overflows, or if the new usage would exceed the limit.
    /// Returns the number of bytes reserved.
    pub fn reserve(&self, dims: &[u64]) -> PanoResult<u64> {
        let usage = self.usage.get();
        let limit = self.limit.get();
        let fail = || PanoError::out_of_memory(dims, usage, limit);

        let increment = dims
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d))
            .ok_or_else(fail)?;
        let new_usage = usage.checked_add(increment).ok_or_else(fail)?;
        if new_usage > limit {
            return Err(fail());
        }

        self.usage.set(new_usage);
        tracing::trace!(bytes = increment, usage = new_usage, "memory reserved");
        Ok(increment)
    }

    /// Release memory previously reserved with the same `dims`.
    pub fn release(&self, dims: &[u64]) {
        let bytes = dims.iter().fold(1u64, |acc, &d| acc.wrapping_mul(d));
        let usage = self.usage.get().saturating_sub(bytes);
        self.usage.set(usage);
        tracing::trace!(bytes, usage, "memory released");
    }

    /// Reserve `dims` bytes and return a guard which releases them on drop.
    pub fn claim(self: &Rc<Self>, dims: &[u64]) -> PanoResult<Reservation> {
        let bytes = self.reserve(dims)?;
        Ok(Reservation {
            budget: Rc::clone(self),
            bytes,
        })
    }
}

/// An accounted allocation, released from its [`MemoryBudget`] when dropped.
#[derive(Debug)]
pub struct Reservation {
    budget: Rc<MemoryBudget>,
    bytes: u64,
}

impl Reservation {
    /// Number of bytes held by this reservation.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.budget.release(&[self.bytes]);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/budget.rs"]
mod tests;
