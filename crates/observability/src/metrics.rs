//! 投递管道指标模块
//!
//! 通过 `metrics` facade 记录；未安装 recorder 时为空操作。

use metrics::{counter, gauge, histogram};

/// 记录被接受的记录 (signal / trace)
pub fn record_record_accepted(kind: &'static str) {
    counter!("signal_sdk_records_accepted_total", "kind" => kind).increment(1);
}

/// 记录累积器产出的批次
///
/// `trigger` 为 size / linger / forced。
pub fn record_batch_emitted(len: usize, trigger: &'static str) {
    counter!("signal_sdk_batches_emitted_total", "trigger" => trigger).increment(1);
    histogram!("signal_sdk_batch_size").record(len as f64);
}

/// 记录一次批次投递结果
///
/// `outcome` 为 delivered 或 `DeliveryError::label()`。
pub fn record_batch_delivery(outcome: &'static str, records: usize) {
    counter!("signal_sdk_batch_deliveries_total", "outcome" => outcome).increment(1);
    counter!("signal_sdk_records_delivered_total", "outcome" => outcome).increment(records as u64);
}

/// 记录单次 HTTP 请求耗时
pub fn record_send_latency_ms(latency_ms: f64) {
    histogram!("signal_sdk_send_latency_ms").record(latency_ms);
}

/// 记录发送队列深度
pub fn record_pool_queue_depth(depth: usize) {
    gauge!("signal_sdk_pool_queue_depth").set(depth as f64);
}
