//! Blocking coordination primitives.

mod count_down_latch;

pub use count_down_latch::CountDownLatch;
