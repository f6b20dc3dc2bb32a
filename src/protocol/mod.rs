pub mod deserializer;
pub mod message;
pub mod serializer;

// Agency clients never send more than 8KiB per frame,
// anything larger is a broken or hostile peer.
pub const MAX_PAYLOAD: usize = 8192;

// Fixed acknowledgement value for a stored batch.
pub const BATCH_ACCEPTED: u16 = 1;

pub mod continuation {
    pub const LAST_BATCH: u16 = 0;
    pub const MORE_BATCHES: u16 = 1;
}
