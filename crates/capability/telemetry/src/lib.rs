//! 日志追踪初始化与进程级计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 计数器快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connect_attempts: u64,
    pub connect_failures: u64,
    pub requests: u64,
    pub retries: u64,
    pub retries_exhausted: u64,
    pub exception_responses: u64,
    pub tag_reads_ok: u64,
    pub tag_reads_failed: u64,
    pub tag_writes_ok: u64,
    pub tag_writes_failed: u64,
}

/// 进程级计数器（无锁原子量）。
pub struct TelemetryMetrics {
    connect_attempts: AtomicU64,
    connect_failures: AtomicU64,
    requests: AtomicU64,
    retries: AtomicU64,
    retries_exhausted: AtomicU64,
    exception_responses: AtomicU64,
    tag_reads_ok: AtomicU64,
    tag_reads_failed: AtomicU64,
    tag_writes_ok: AtomicU64,
    tag_writes_failed: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            connect_attempts: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
            requests: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            retries_exhausted: AtomicU64::new(0),
            exception_responses: AtomicU64::new(0),
            tag_reads_ok: AtomicU64::new(0),
            tag_reads_failed: AtomicU64::new(0),
            tag_writes_ok: AtomicU64::new(0),
            tag_writes_failed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            retries_exhausted: self.retries_exhausted.load(Ordering::Relaxed),
            exception_responses: self.exception_responses.load(Ordering::Relaxed),
            tag_reads_ok: self.tag_reads_ok.load(Ordering::Relaxed),
            tag_reads_failed: self.tag_reads_failed.load(Ordering::Relaxed),
            tag_writes_ok: self.tag_writes_ok.load(Ordering::Relaxed),
            tag_writes_failed: self.tag_writes_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 记录一次建连尝试。
pub fn record_connect_attempt() {
    metrics().connect_attempts.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次建连失败。
pub fn record_connect_failure() {
    metrics().connect_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次线上请求（每次尝试计一次）。
pub fn record_request() {
    metrics().requests.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次重试（连接类故障后进入下一次尝试）。
pub fn record_retry() {
    metrics().retries.fetch_add(1, Ordering::Relaxed);
}

/// 记录重试耗尽。
pub fn record_retries_exhausted() {
    metrics().retries_exhausted.fetch_add(1, Ordering::Relaxed);
}

/// 记录从站异常响应。
pub fn record_exception_response() {
    metrics().exception_responses.fetch_add(1, Ordering::Relaxed);
}

/// 记录标签读取结果。
pub fn record_tag_read(ok: bool) {
    let metrics = metrics();
    if ok {
        metrics.tag_reads_ok.fetch_add(1, Ordering::Relaxed);
    } else {
        metrics.tag_reads_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// 记录标签写入结果。
pub fn record_tag_write(ok: bool) {
    let metrics = metrics();
    if ok {
        metrics.tag_writes_ok.fetch_add(1, Ordering::Relaxed);
    } else {
        metrics.tag_writes_failed.fetch_add(1, Ordering::Relaxed);
    }
}
