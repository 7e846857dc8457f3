//! # Client
//!
//! 安全信号 SDK 的公共入口。
//!
//! 负责：
//! - 构建 Signal / Trace 并送入累积器
//! - 将就绪批次交给发送池 (fire-and-forget)
//! - `close()` 时强制刷新并等待发送池排空
//!
//! ## 使用示例
//!
//! ```no_run
//! use client::Client;
//! use contracts::{ClientConfig, Properties};
//!
//! let client = Client::new(ClientConfig::new("my-token").with_app_name("shop")).unwrap();
//!
//! client
//!     .point("sq.agent.login", serde_json::json!({"user": "bob"}), Properties::new())
//!     .unwrap();
//!
//! client.close();
//! ```

mod client;
mod error;
mod metrics;
mod pool;

pub use client::{Client, USER_AGENT};
pub use error::{ClientError, Result};
pub use metrics::{DeliveryMetrics, MetricsSnapshot};
pub use pool::SenderPool;

// Re-export the record model so most callers only need this crate
pub use contracts::{
    ClientConfig, Properties, Record, Signal, SignalKind, Trace, TraceData, Value,
};
