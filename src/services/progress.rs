//! 进度回调
//!
//! 粗粒度的 `(百分比, 消息)` 通知：登录开始 / 完成、每行完成、全部完成。

use async_trait::async_trait;
use tracing::info;

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoginStarted,
    LoginComplete,
    RowComplete,
    Done,
}

/// 进度回调接口
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    async fn on_progress(&self, phase: Phase, percent: u8, message: &str);
}

/// 不需要进度时使用
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_progress(&self, _phase: Phase, _percent: u8, _message: &str) {}
}

/// 把进度写入 tracing 日志
pub struct TracingProgress;

#[async_trait]
impl ProgressCallback for TracingProgress {
    async fn on_progress(&self, _phase: Phase, percent: u8, message: &str) {
        info!("📈 [{:>3}%] {}", percent, message);
    }
}

/// 第 `done` 行（从 1 计）完成时的百分比：20 → 100 线性分布
pub fn row_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = 20 + (80 * done.min(total)) / total;
    pct as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_percent() {
        assert_eq!(row_percent(1, 4), 40);
        assert_eq!(row_percent(4, 4), 100);
        assert_eq!(row_percent(0, 0), 100);
        assert_eq!(row_percent(1, 3), 46);
    }

    #[test]
    fn test_noop_progress_is_callable() {
        tokio_test::block_on(NoopProgress.on_progress(Phase::Done, 100, "done"));
    }
}
