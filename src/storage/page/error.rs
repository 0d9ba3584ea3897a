use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("page is full")]
    PageFull,

    #[error("invalid slot {0}")]
    InvalidSlot(usize),

    #[error("slot {0} is empty")]
    EmptySlot(usize),

    #[error("tuple has no record id")]
    MissingRecordId,

    #[error("tuple does not belong to this page")]
    WrongPage,

    #[error("tuple schema does not match page schema")]
    SchemaMismatch,

    #[error("page image has wrong length: {0}")]
    TruncatedImage(usize),
}
