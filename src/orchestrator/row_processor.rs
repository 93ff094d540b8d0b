//! 批次行处理器 - 编排层
//!
//! ## 职责
//!
//! 针对单个提交目标（一个季度）顺序处理一批条目：
//!
//! 1. **会话生命周期**：启动、登录、结束后无论成败都关闭
//! 2. **行循环**：逐行委托 `RowFlow`，单行失败不影响后续行
//! 3. **恢复**：页面类错误后尽力恢复会话，恢复失败记入该行的错误信息
//! 4. **进度**：登录开始 / 完成、每行完成、全部完成

use tracing::{error, info, warn};

use crate::config::Credentials;
use crate::models::{AutomationResult, TimesheetEntry};
use crate::services::progress::row_percent;
use crate::services::{Phase, ProgressCallback, SessionController};
use crate::workflow::{RowCtx, RowFlow, RowOutcome};

/// 对一批条目运行完整的自动化流程
///
/// 空批次直接返回，不启动会话。登录之前的错误会中止本次运行，
/// 所有行以同一条信息记为失败。
pub async fn run_automation(
    session: &mut SessionController,
    flow: &RowFlow<'_>,
    entries: &[TimesheetEntry],
    credentials: &Credentials,
    progress: &dyn ProgressCallback,
) -> AutomationResult {
    if entries.is_empty() {
        info!("没有待提交的条目，跳过浏览器会话");
        return AutomationResult::empty();
    }

    progress
        .on_progress(Phase::LoginStarted, 10, "Logging in")
        .await;

    if let Err(e) = start_and_login(session, credentials).await {
        error!("❌ 会话建立失败: {}", e);
        close_session(session).await;
        return AutomationResult::aborted(entries.len(), e.to_string());
    }

    progress
        .on_progress(Phase::LoginComplete, 20, "Login complete")
        .await;

    let result = process_rows(session, flow, entries, progress).await;
    close_session(session).await;

    progress
        .on_progress(
            Phase::Done,
            100,
            &format!(
                "Submitted {}/{} entries",
                result.success_count, result.total_rows
            ),
        )
        .await;

    result
}

async fn start_and_login(
    session: &mut SessionController,
    credentials: &Credentials,
) -> crate::error::SessionResult<()> {
    session.start().await?;
    session.authenticate(credentials).await
}

async fn process_rows(
    session: &mut SessionController,
    flow: &RowFlow<'_>,
    entries: &[TimesheetEntry],
    progress: &dyn ProgressCallback,
) -> AutomationResult {
    let total = entries.len();
    let mut result = AutomationResult {
        total_rows: total,
        ..Default::default()
    };

    for (index, entry) in entries.iter().enumerate() {
        let ctx = RowCtx::new(index, total, entry);

        match flow.run(session, entry, &ctx).await {
            Ok(RowOutcome::Submitted { .. }) => result.record_success(index),
            Ok(RowOutcome::AlreadySubmitted) => {}
            Err(e) => {
                error!("{} ❌ {}", ctx, e);
                let mut message = e.to_string();
                if e.needs_recovery() {
                    if let Err(recover_err) = session.recover().await {
                        warn!("{} ⚠️ 会话恢复失败: {}", ctx, recover_err);
                        message = format!("{}; recovery failed: {}", message, recover_err);
                    }
                }
                result.record_failure(index, message);
            }
        }

        progress
            .on_progress(
                Phase::RowComplete,
                row_percent(index + 1, total),
                &format!("Processed row {}/{}", index + 1, total),
            )
            .await;
    }

    result.finish()
}

async fn close_session(session: &mut SessionController) {
    if let Err(e) = session.close().await {
        warn!("⚠️ 关闭会话失败: {}", e);
    }
}
