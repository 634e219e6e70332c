mod frame_store;

pub use frame_store::{FrameStore, LocalFrameStore};
