//! The owned backing allocation behind a [`Surface`](crate::Surface).

/// A fixed-capacity, heap-allocated block of `T` values.
///
/// `Buffer` is pure storage: it has no notion of shape. Surfaces share a
/// buffer through `Arc<Buffer<T>>`, and the `Arc` strong count is the
/// reference count consulted by [`Surface::create`](crate::Surface::create)
/// when deciding whether the storage may be reinterpreted in place. The
/// allocation is freed when the last referencing surface drops its handle.
pub struct Buffer<T> {
    ptr: *mut T,
    capacity: usize,
}

impl<T> Buffer<T> {
    /// Allocates a buffer of `capacity` value-initialized elements.
    pub fn allocate(capacity: usize) -> Buffer<T>
    where
        T: Clone + Default,
    {
        Self::from_vec(vec![T::default(); capacity])
    }

    /// Creates a buffer that takes ownership of the vector's elements.
    ///
    /// The buffer capacity is exactly the vector's length.
    pub fn from_vec(vec: Vec<T>) -> Buffer<T> {
        let boxed = vec.into_boxed_slice();
        let capacity = boxed.len();
        let ptr = Box::into_raw(boxed) as *mut T;
        Buffer { ptr, capacity }
    }

    /// Returns the element capacity of the allocation.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the base address of the allocation.
    ///
    /// The pointer is valid for reads and writes of `capacity` elements for
    /// as long as the buffer is alive; writes through aliasing surfaces are
    /// subject to the caller contract described on
    /// [`Surface`](crate::Surface).
    #[inline]
    pub fn base_ptr(&self) -> *mut T {
        self.ptr
    }
}

impl<T> Drop for Buffer<T> {
    fn drop(&mut self) {
        // Reconstitute the Box<[T]> handed out in from_vec.
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                self.ptr,
                self.capacity,
            )));
        }
    }
}

unsafe impl<T: Send> Send for Buffer<T> {}

unsafe impl<T: Sync> Sync for Buffer<T> {}

impl<T> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
