//! Raw-pointer wrappers for the lock-free lists.
//!
//! The logical-deletion mark lives in a dedicated atomic flag on each node,
//! not in the low bits of the successor pointer, so these wrappers carry no
//! tagging support.

use std::ptr::null_mut;
use std::sync::atomic::{AtomicPtr, Ordering};

pub struct CompareExchangeError<T, P: Pointer<T>> {
    pub new: P,
    pub current: Shared<T>,
}

pub struct Atomic<T> {
    link: AtomicPtr<T>,
}

unsafe impl<T> Sync for Atomic<T> {}
unsafe impl<T> Send for Atomic<T> {}

impl<T> Atomic<T> {
    #[inline]
    pub fn null() -> Self {
        Self {
            link: AtomicPtr::new(null_mut()),
        }
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> Shared<T> {
        Shared {
            ptr: self.link.load(order),
        }
    }

    #[inline]
    pub fn store(&self, ptr: Shared<T>, order: Ordering) {
        self.link.store(ptr.into_raw(), order)
    }

    #[inline]
    pub fn compare_exchange<P: Pointer<T>>(
        &self,
        current: Shared<T>,
        new: P,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Shared<T>, CompareExchangeError<T, P>> {
        let current = current.into_raw();
        let new = new.into_raw();

        match self.link.compare_exchange(current, new, success, failure) {
            Ok(current) => Ok(Shared { ptr: current }),
            Err(current) => {
                let new = unsafe { P::from_raw(new) };
                Err(CompareExchangeError {
                    new,
                    current: Shared { ptr: current },
                })
            }
        }
    }

    /// Takes ownership of the pointee, if any.
    ///
    /// # Safety
    ///
    /// No other thread may hold a reference to the pointee.
    #[inline]
    pub unsafe fn try_into_owned(self) -> Option<Box<T>> {
        let ptr = self.link.into_inner();
        if ptr.is_null() {
            None
        } else {
            Some(unsafe { Box::from_raw(ptr) })
        }
    }
}

impl<T> Default for Atomic<T> {
    #[inline]
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Shared<T>> for Atomic<T> {
    #[inline]
    fn from(value: Shared<T>) -> Self {
        Self {
            link: AtomicPtr::new(value.into_raw()),
        }
    }
}

pub struct Shared<T> {
    ptr: *mut T,
}

impl<T> Shared<T> {
    #[inline]
    pub fn from_owned(init: T) -> Shared<T> {
        Self {
            ptr: Box::into_raw(Box::new(init)),
        }
    }

    #[inline]
    pub fn null() -> Self {
        Self { ptr: null_mut() }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// # Safety
    ///
    /// The pointee must be alive for `'g` and not mutated through `&T`.
    #[inline]
    pub unsafe fn as_ref<'g>(&self) -> Option<&'g T> {
        unsafe { self.ptr.as_ref() }
    }

    /// # Safety
    ///
    /// The pointer must be non-null and the pointee alive for `'g`.
    #[inline]
    pub unsafe fn deref<'g>(&self) -> &'g T {
        unsafe { &*self.ptr }
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Shared<T> {}

impl<T> PartialEq for Shared<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for Shared<T> {}

pub trait Pointer<T> {
    fn into_raw(self) -> *mut T;
    /// # Safety
    ///
    /// `val` must have come from a matching `into_raw`.
    unsafe fn from_raw(val: *mut T) -> Self;
}

impl<T> Pointer<T> for Shared<T> {
    #[inline]
    fn into_raw(self) -> *mut T {
        self.ptr
    }

    #[inline]
    unsafe fn from_raw(val: *mut T) -> Self {
        Shared { ptr: val }
    }
}

impl<T> Pointer<T> for Box<T> {
    #[inline]
    fn into_raw(self) -> *mut T {
        Box::into_raw(self)
    }

    #[inline]
    unsafe fn from_raw(val: *mut T) -> Self {
        unsafe { Box::from_raw(val) }
    }
}
