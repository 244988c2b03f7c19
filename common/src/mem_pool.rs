// Memory pool allocator
//
// A generic typed memory pool for zero-allocation object management after initialization.
// Designed for single-threaded, low-latency use cases where allocation predictability
// is critical (e.g., per-component pools in trading systems).
//
// # Safety Invariants
//
// This pool uses interior mutability via UnsafeCell for single-threaded performance.
// The following invariants must be maintained:
//
// 1. Single-threaded access only - no concurrent access to the same pool
// 2. PoolPtr must not be cloned - each PoolPtr represents unique ownership of a slot
// 3. A PoolPtr must only be used with the pool that created it
// 4. A PoolPtr must not be used after deallocation (use-after-free)
// 5. Each slot must be deallocated exactly once (no double-free)

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::marker::PhantomData;

/// A pre-allocated pool of N objects of type T.
///
/// Provides O(1) allocation and deallocation with zero heap allocations
/// after initialization. Uses a free-list implemented as a stack of indices.
///
/// # Safety
///
/// This type is designed for **single-threaded use only**. Using it from
/// multiple threads simultaneously is undefined behavior.
///
/// # Example
///
/// ```
/// use common::mem_pool::MemPool;
///
/// let pool: MemPool<u64, 16> = MemPool::new();
///
/// // Allocate a slot
/// let ptr = pool.allocate().expect("pool not exhausted");
///
/// // Write to the slot
/// *pool.get_mut(&ptr) = 42;
///
/// // Read from the slot
/// assert_eq!(*pool.get(&ptr), 42);
///
/// // Return the slot to the pool
/// pool.deallocate(ptr);
/// ```
pub struct MemPool<T, const N: usize> {
    /// Storage for pool objects. Objects are uninitialized until allocated
    /// and written to by the user.
    storage: UnsafeCell<[MaybeUninit<T>; N]>,

    /// Stack of free indices. free_list[0..free_count] contains valid free indices.
    /// The top of the stack is at free_list[free_count - 1].
    free_list: UnsafeCell<[usize; N]>,

    /// Number of available (free) slots. Also serves as the stack pointer
    /// for the free list.
    free_count: UnsafeCell<usize>,
}

/// A pointer to an allocated slot in a MemPool.
///
/// This type does NOT implement Clone to prevent double-free bugs.
/// Each PoolPtr represents unique ownership of a slot in the pool.
///
/// # Safety
///
/// - Must only be used with the pool that created it
/// - Must not be used after being passed to `deallocate()`
/// - Must be deallocated exactly once (or leaked intentionally)
pub struct PoolPtr<T> {
    /// Index into the pool's storage array
    index: usize,

    /// Direct pointer for fast access (avoids index calculation)
    ptr: *mut T,

    /// Marker to tie the lifetime to type T without owning it
    _marker: PhantomData<T>,
}

// PoolPtr is Send if T is Send (can transfer ownership across threads)
// but the pool itself should only be used from one thread
unsafe impl<T: Send> Send for PoolPtr<T> {}

impl<T, const N: usize> MemPool<T, N> {
    /// Creates a new memory pool with all N slots available.
    ///
    /// The storage is uninitialized - objects are only initialized
    /// when the user writes to an allocated slot.
    ///
    /// # Warning
    ///
    /// For large pools (N > 1024), this may cause stack overflow because
    /// the arrays are created on the stack before being returned. Use
    /// `new_boxed()` instead for large pools.
    ///
    /// # Panics
    ///
    /// Panics if N is 0 (a zero-capacity pool is not useful).
    pub fn new() -> Self {
        assert!(N > 0, "MemPool capacity must be greater than 0");

        // Initialize free list with all indices [0, 1, 2, ..., N-1]
        // We use a const fn approach to initialize at compile time where possible
        let mut free_list = [0usize; N];
        let mut i = 0;
        while i < N {
            free_list[i] = i;
            i += 1;
        }

        Self {
            // SAFETY: MaybeUninit doesn't require initialization
            storage: UnsafeCell::new(unsafe {
                MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init()
            }),
            free_list: UnsafeCell::new(free_list),
            free_count: UnsafeCell::new(N),
        }
    }

    /// Creates a new memory pool directly on the heap, avoiding stack overflow
    /// for large pools.
    ///
    /// This is the preferred way to create large pools (N > 1024).
    ///
    /// # Panics
    ///
    /// Panics if N is 0 (a zero-capacity pool is not useful).
    pub fn new_boxed() -> Box<Self> {
        assert!(N > 0, "MemPool capacity must be greater than 0");

        // Use alloc API to allocate zeroed memory directly on heap
        // This avoids any stack allocation of the large arrays
        use std::alloc::{alloc_zeroed, Layout};

        // SAFETY: Layout is valid for MemPool<T, N>
        let layout = Layout::new::<Self>();
        let ptr = unsafe { alloc_zeroed(layout) as *mut Self };

        if ptr.is_null() {
            std::alloc::handle_alloc_error(layout);
        }

        // SAFETY: We allocated valid memory and will initialize it properly.
        // UnsafeCell has the same memory layout as its inner type, so zeroed
        // memory is a valid representation. We just need to write the actual
        // values we need (free_count and free_list indices).
        unsafe {
            // Write free_count value (N) directly into the UnsafeCell's inner value
            // UnsafeCell<usize> has the same layout as usize
            let free_count_inner = std::ptr::addr_of_mut!((*ptr).free_count) as *mut usize;
            std::ptr::write(free_count_inner, N);

            // Storage is zeroed which is fine - MaybeUninit doesn't require initialization
            // The UnsafeCell wrapper is transparent in memory layout

            // Initialize free_list with indices 0..N
            // UnsafeCell<[usize; N]> has same layout as [usize; N]
            let free_list_inner = std::ptr::addr_of_mut!((*ptr).free_list) as *mut [usize; N];
            for i in 0..N {
                (*free_list_inner)[i] = i;
            }

            Box::from_raw(ptr)
        }
    }

    /// Allocates a slot from the pool.
    ///
    /// Returns `Some(PoolPtr)` if a slot is available, `None` if the pool is exhausted.
    /// The allocated slot contains uninitialized memory - the caller must initialize
    /// it before reading.
    ///
    /// # Safety
    ///
    /// This method uses interior mutability. Caller must ensure single-threaded access.
    ///
    /// # Performance
    ///
    /// O(1) - simply pops from the free list stack.
    #[inline]
    pub fn allocate(&self) -> Option<PoolPtr<T>> {
        // SAFETY: Single-threaded access is required by the type's contract
        unsafe {
            let free_count = &mut *self.free_count.get();

            if *free_count == 0 {
                return None;
            }

            // Pop index from free list stack
            *free_count -= 1;
            let free_list = &*self.free_list.get();
            let index = free_list[*free_count];

            // Get pointer to the storage slot
            let storage = &mut *self.storage.get();
            let ptr = storage[index].as_mut_ptr();

            Some(PoolPtr {
                index,
                ptr,
                _marker: PhantomData,
            })
        }
    }

    /// Returns a slot to the pool.
    ///
    /// After this call, the PoolPtr is consumed and must not be used again.
    /// The slot becomes available for future allocations.
    ///
    /// # Safety
    ///
    /// - The PoolPtr must have been allocated from this pool
    /// - The PoolPtr must not have been previously deallocated (no double-free)
    /// - After deallocation, any references obtained via get/get_mut are invalidated
    ///
    /// # Performance
    ///
    /// O(1) - simply pushes to the free list stack.
    ///
    /// # Note
    ///
    /// This does NOT drop the value at the slot. If T requires cleanup,
    /// the caller must explicitly drop it before deallocating:
    ///
    /// ```ignore
    /// unsafe { std::ptr::drop_in_place(pool.get_mut(&ptr)) };
    /// pool.deallocate(ptr);
    /// ```
    #[inline]
    pub fn deallocate(&self, ptr: PoolPtr<T>) {
        debug_assert!(ptr.index < N, "PoolPtr index out of bounds - wrong pool?");

        // SAFETY: Single-threaded access is required by the type's contract
        unsafe {
            let free_count = &mut *self.free_count.get();
            let free_list = &mut *self.free_list.get();

            debug_assert!(
                *free_count < N,
                "Double-free detected: pool already has all slots free"
            );

            // Push index back onto free list stack
            free_list[*free_count] = ptr.index;
            *free_count += 1;
        }

        // ptr is consumed here, preventing reuse
    }

    /// Returns a shared reference to the object at the given slot.
    ///
    /// # Safety
    ///
    /// - The PoolPtr must have been allocated from this pool and not yet deallocated
    /// - The slot must have been initialized (written to) before reading
    /// - No mutable reference to the same slot must exist
    #[inline]
    pub fn get(&self, ptr: &PoolPtr<T>) -> &T {
        debug_assert!(ptr.index < N, "PoolPtr index out of bounds");

        // SAFETY: Caller guarantees the slot is allocated, initialized,
        // and no mutable references exist
        unsafe { &*ptr.ptr }
    }

    /// Returns a mutable reference to the object at the given slot.
    ///
    /// # Safety
    ///
    /// - The PoolPtr must have been allocated from this pool and not yet deallocated
    /// - No other references (shared or mutable) to the same slot must exist
    #[inline]
    pub fn get_mut(&self, ptr: &PoolPtr<T>) -> &mut T {
        debug_assert!(ptr.index < N, "PoolPtr index out of bounds");

        // SAFETY: Caller guarantees the slot is allocated and no other
        // references exist. Interior mutability is used intentionally.
        unsafe { &mut *ptr.ptr }
    }

    /// Returns the number of available (free) slots.
    #[inline]
    pub fn available(&self) -> usize {
        // SAFETY: Reading a usize is atomic on supported platforms,
        // and single-threaded access is required anyway
        unsafe { *self.free_count.get() }
    }

    /// Returns the total capacity of the pool.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns a mutable reference to the object at the given index.
    ///
    /// This method is useful when you have stored the index (e.g., in a hash map)
    /// and need to access the object directly without a PoolPtr. This is common
    /// in order book implementations where order IDs map to pool indices.
    ///
    /// # Arguments
    ///
    /// * `index` - The index into the pool's storage array
    ///
    /// # Returns
    ///
    /// `Some(&mut T)` if the index is within bounds, `None` otherwise.
    ///
    /// # Safety
    ///
    /// - The index must refer to an allocated slot (not a free slot)
    /// - The slot must have been initialized (written to) before reading
    /// - No other references (shared or mutable) to the same slot must exist
    /// - This method uses interior mutability; single-threaded access is required
    ///
    /// # Note
    ///
    /// This method does NOT check whether the slot is currently allocated.
    /// The caller must ensure the index refers to a valid, allocated slot.
    /// Using an index for a free (deallocated) slot is undefined behavior.
    #[inline]
    pub fn get_by_index(&self, index: usize) -> Option<&mut T> {
        if index >= N {
            return None;
        }

        // SAFETY: Caller guarantees the slot at index is allocated, initialized,
        // and no other references exist. Interior mutability is used intentionally
        // for single-threaded performance.
        unsafe {
            let storage = &mut *self.storage.get();
            Some(&mut *storage[index].as_mut_ptr())
        }
    }

    /// Returns a mutable reference to the object at the given index without bounds checking.
    ///
    /// This is the unchecked version of `get_by_index` for maximum performance
    /// in hot paths where the index is known to be valid.
    ///
    /// # Safety
    ///
    /// - The index must be less than N (the pool capacity)
    /// - The index must refer to an allocated slot (not a free slot)
    /// - The slot must have been initialized (written to) before reading
    /// - No other references (shared or mutable) to the same slot must exist
    /// - Single-threaded access is required (interior mutability)
    ///
    /// Violating any of these conditions results in undefined behavior.
    #[inline]
    pub unsafe fn get_by_index_unchecked(&self, index: usize) -> &mut T {
        debug_assert!(index < N, "index out of bounds");

        // SAFETY: Caller guarantees all safety requirements are met
        let storage = &mut *self.storage.get();
        &mut *storage[index].as_mut_ptr()
    }

    /// Returns a slot to the pool by its index, for callers that track
    /// slots as plain `usize` (e.g. via a secondary lookup map) rather
    /// than holding on to the `PoolPtr`.
    ///
    /// # Safety
    ///
    /// - `index` must refer to a slot that is currently allocated
    /// - The slot must not already have been deallocated (no double-free)
    /// - No other references to the slot may be alive after this call
    /// - This does NOT drop the value at the slot; callers responsible
    ///   for `T: Drop` must do so before calling this
    #[inline]
    pub unsafe fn deallocate_by_index(&self, index: usize) {
        debug_assert!(index < N, "index out of bounds - wrong pool?");

        let free_count = &mut *self.free_count.get();
        let free_list = &mut *self.free_list.get();

        debug_assert!(
            *free_count < N,
            "Double-free detected: pool already has all slots free"
        );

        free_list[*free_count] = index;
        *free_count += 1;
    }
}

impl<T, const N: usize> Default for MemPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: MemPool can be sent between threads, but should only be used
// from one thread at a time
unsafe impl<T: Send, const N: usize> Send for MemPool<T, N> {}

// Note: We intentionally do NOT implement Sync, as concurrent access is unsafe

impl<T> PoolPtr<T> {
    /// Returns the index of this slot in the pool.
    ///
    /// Useful for debugging or logging purposes.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}
