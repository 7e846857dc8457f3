//! # Batching
//!
//! 记录累积器：按数量与驻留时间两个阈值切分批次。
//!
//! 负责：
//! - 在单个临界区内追加记录并判定批次是否就绪
//! - 就绪时原子地换出当前批次，下一批次惰性创建
//! - 可注入时钟 (`MonotonicClock` 默认，`ManualClock` 测试用)
//!
//! ## 使用示例
//!
//! ```ignore
//! use batching::Accumulator;
//! use contracts::{BatchingConfig, Signal};
//!
//! let accumulator = Accumulator::new(BatchingConfig::default());
//!
//! if let Some(batch) = accumulator.add(Signal::new("sq.agent.login", 1)) {
//!     // hand the batch to a sender
//! }
//! ```

mod accumulator;
mod clock;

pub use accumulator::{Accumulator, FlushTrigger};
pub use clock::{Clock, ManualClock, MonotonicClock};
