/// A type-erased node awaiting reclamation.
#[derive(Clone, Copy)]
pub struct Retired {
    ptr: *mut u8,
    deleter: unsafe fn(*mut u8),
}

unsafe impl Send for Retired {}

impl Retired {
    pub fn new<T>(ptr: *mut T) -> Self {
        Self {
            ptr: ptr.cast(),
            deleter: free::<T>,
        }
    }

    pub(crate) fn ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// # Safety
    ///
    /// No hazard slot may reference the pointer, and it must not be freed
    /// twice.
    pub(crate) unsafe fn free(self) {
        unsafe { (self.deleter)(self.ptr) };
    }
}

unsafe fn free<T>(ptr: *mut u8) {
    drop(unsafe { Box::from_raw(ptr.cast::<T>()) })
}
