// Storage module exports

pub mod buffer;
pub mod heap_file;
pub mod page;
pub mod tuple;

pub use buffer::BufferPool;
pub use heap_file::HeapFile;
pub use page::{HeapPage, PageError, PageId};
pub use tuple::{Field, RecordId, Tuple, TupleDesc, Type};
