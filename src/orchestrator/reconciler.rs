//! 结果回写 - 编排层
//!
//! 把一次运行的行索引结果映射回条目 ID 并落库：
//! 成功 → 标记已提交；失败 → 记录到失败文件后永久删除；未处理 → 保持待提交。

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::error::{AppResult, BusinessError};
use crate::models::{AutomationResult, SubmissionResult, TimesheetEntry};
use crate::services::WarnWriter;
use crate::store::EntryStore;

pub struct Reconciler<'a> {
    store: &'a EntryStore,
    warn_writer: &'a WarnWriter,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a EntryStore, warn_writer: &'a WarnWriter) -> Self {
        Self { store, warn_writer }
    }

    /// 回写一次运行的结果
    ///
    /// `entries` 必须是传给自动化运行的同一个切片，索引一一对应。
    /// 运行被致命错误中止时不删除任何条目，它们从未到达提交目标。
    pub fn reconcile(
        &self,
        entries: &[TimesheetEntry],
        result: &AutomationResult,
    ) -> AppResult<SubmissionResult> {
        let len = entries.len();
        let check = |index: usize| -> AppResult<usize> {
            if index < len {
                Ok(index)
            } else {
                Err(BusinessError::IndexOutOfRange { index, len }.into())
            }
        };

        let submitted: BTreeSet<usize> = result
            .submitted_indices
            .iter()
            .map(|&i| check(i))
            .collect::<AppResult<_>>()?;
        let failed: BTreeSet<usize> = if result.fatal_error.is_some() {
            BTreeSet::new()
        } else {
            result
                .errors
                .iter()
                .map(|(i, _)| check(*i))
                .collect::<AppResult<BTreeSet<_>>>()?
                .difference(&submitted)
                .copied()
                .collect()
        };

        let submitted_ids: Vec<i64> = submitted.iter().map(|&i| entries[i].id).collect();
        let removed_ids: Vec<i64> = failed.iter().map(|&i| entries[i].id).collect();

        if !submitted_ids.is_empty() {
            let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
            let marked = self.store.mark_submitted(&submitted_ids, &now)?;
            info!("✓ {} 条条目已标记为已提交", marked);
        }

        for &index in &failed {
            let reason = result.error_for(index).unwrap_or("unknown error");
            if let Err(e) = self.warn_writer.write(&entries[index], reason) {
                warn!("⚠️ 写入失败记录 {} 失败: {}", self.warn_writer.path(), e);
            }
        }
        if !removed_ids.is_empty() {
            let deleted = self.store.delete_entries(&removed_ids)?;
            warn!(
                "已删除 {} 条失败条目，详情见 {}",
                deleted,
                self.warn_writer.path()
            );
        }

        let error = match &result.fatal_error {
            Some(fatal) => Some(fatal.clone()),
            None if !removed_ids.is_empty() => Some(format!(
                "{} entries failed and were removed",
                removed_ids.len()
            )),
            None => None,
        };

        Ok(SubmissionResult {
            ok: result.ok,
            success_count: submitted_ids.len(),
            removed_count: removed_ids.len(),
            submitted_ids,
            removed_ids,
            total_processed: result.total_rows,
            error,
        })
    }
}
