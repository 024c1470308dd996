//! DRAM Buffer Implementation.
//!
//! Backing storage for a RAM region. On Unix the buffer is an anonymous `mmap`, so pages
//! are only committed when first touched and a large board RAM costs nothing until the
//! loader writes into it. Elsewhere a zeroed `Vec` is used.

use std::slice;

/// Zero-initialised byte storage of a fixed size.
#[derive(Debug)]
pub struct DramBuffer {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer exclusively owns its allocation; all access goes through `&self`
// (reads) or `&mut self` (writes).
unsafe impl Send for DramBuffer {}
// SAFETY: shared references only permit reads.
unsafe impl Sync for DramBuffer {}

impl DramBuffer {
    /// Allocates `size` zeroed bytes.
    ///
    /// Falls back to a heap allocation if `mmap` fails.
    pub fn new(size: usize) -> Self {
        #[cfg(unix)]
        {
            if size > 0 {
                // SAFETY: anonymous private mapping with no address hint; the result is
                // checked against MAP_FAILED before use.
                let ptr = unsafe {
                    libc::mmap(
                        std::ptr::null_mut(),
                        size,
                        libc::PROT_READ | libc::PROT_WRITE,
                        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                        -1,
                        0,
                    )
                };
                if ptr != libc::MAP_FAILED {
                    return Self {
                        ptr: ptr.cast::<u8>(),
                        size,
                        is_mmap: true,
                    };
                }
            }
        }

        let mut vec = vec![0u8; size].into_boxed_slice();
        let ptr = vec.as_mut_ptr();
        std::mem::forget(vec);
        Self {
            ptr,
            size,
            is_mmap: false,
        }
    }

    /// Size in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// True for a zero-sized buffer.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Borrows `len` bytes at `offset`, or `None` if the range is out of bounds.
    pub fn read_slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        if end > self.size {
            return None;
        }
        // SAFETY: `offset..end` lies within the allocation.
        Some(unsafe { slice::from_raw_parts(self.ptr.add(offset), len) })
    }

    /// Copies `data` to `offset`. Returns `false` if the range is out of bounds.
    pub fn write_slice(&mut self, offset: usize, data: &[u8]) -> bool {
        let Some(end) = offset.checked_add(data.len()) else {
            return false;
        };
        if end > self.size {
            return false;
        }
        // SAFETY: `offset..end` lies within the allocation and `data` cannot alias it
        // because we hold `&mut self`.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(offset), data.len());
        }
        true
    }
}

impl Drop for DramBuffer {
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: `ptr`/`size` are exactly what `mmap` returned.
            unsafe {
                let _ = libc::munmap(self.ptr.cast(), self.size);
            }
        } else {
            // SAFETY: reconstructs the boxed slice leaked in `new`.
            unsafe {
                drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    self.ptr, self.size,
                )));
            }
        }
    }
}
