use std::sync::atomic::{AtomicUsize, Ordering};

/// Default page size in bytes (4KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of pages held by a buffer pool
pub const DEFAULT_PAGES: usize = 50;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Current page size. All page I/O and slot arithmetic derive from this.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Acquire)
}

/// Override the page size. Tests only; pages written under one size are
/// unreadable under another.
pub fn set_page_size(size: usize) {
    PAGE_SIZE.store(size, Ordering::Release);
}

/// Restore the default page size. Tests only.
pub fn reset_page_size() {
    PAGE_SIZE.store(DEFAULT_PAGE_SIZE, Ordering::Release);
}
