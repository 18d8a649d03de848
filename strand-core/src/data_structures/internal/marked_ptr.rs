// Marked pointer operations using the least significant bit as the delete mark.
//
// Bit layout:
//   Bit 0: DELETE_MARK - the node owning this link is logically deleted
//
// A link word therefore carries the pair {deleted, next} and is read and
// replaced as one unit. Nodes are at least 2-byte aligned, so bit 0 of a
// node address is always free.
//
const DELETE_MARK: usize = 0b1;

/// A pointer that uses the least significant bit as the deletion flag.
pub(crate) struct MarkedPtr<T> {
    ptr: *mut T,
}

// Manual impls to avoid requiring T: Clone/Copy
impl<T> Copy for MarkedPtr<T> {}

impl<T> Clone for MarkedPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for MarkedPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for MarkedPtr<T> {}

impl<T> MarkedPtr<T> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a new MarkedPtr from a (possibly marked) pointer.
    #[inline]
    pub(crate) fn new(ptr: *mut T) -> Self {
        MarkedPtr { ptr }
    }

    /// Null successor, unmarked.
    #[inline]
    pub(crate) fn null() -> Self {
        MarkedPtr {
            ptr: std::ptr::null_mut(),
        }
    }

    /// Strip the mark bit from a raw pointer without creating a MarkedPtr instance.
    #[inline]
    pub(crate) fn unmask(ptr: *mut T) -> *mut T {
        (ptr as usize & !DELETE_MARK) as *mut T
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Get the clean pointer without the mark bit (the one you dereference).
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        Self::unmask(self.ptr)
    }

    /// Get the raw pointer with the mark bit intact (for CAS operations).
    #[inline]
    pub(crate) fn as_raw(&self) -> *mut T {
        self.ptr
    }

    /// Check if the successor is null, regardless of the mark.
    #[cfg(test)]
    #[inline]
    pub(crate) fn is_null(&self) -> bool {
        self.as_ptr().is_null()
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    /// Check if DELETE-marked (bit 0).
    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        (self.ptr as usize & DELETE_MARK) != 0
    }

    // =========================================================================
    // Transformers
    // =========================================================================

    /// Same successor with the mark set or cleared.
    #[inline]
    pub(crate) fn with_mark(&self, mark: bool) -> Self {
        let ptr_bits = self.as_ptr() as usize;
        let marked_bits = if mark {
            ptr_bits | DELETE_MARK
        } else {
            ptr_bits
        };
        MarkedPtr {
            ptr: marked_bits as *mut T,
        }
    }
}
