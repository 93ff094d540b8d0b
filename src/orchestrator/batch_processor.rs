//! 提交任务入口 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整提交运行的资源和调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：建库、加载季度表、选择浏览器获取方式
//! 2. **单飞保护**：同一时间只允许一次提交运行
//! 3. **按季度分组**：每个季度对应一个提交目标，各自开一个会话
//! 4. **结果回写**：委托 `Reconciler` 落库
//! 5. **全局统计**：汇总所有季度的结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单行的细节
//! - **向下委托**：委托 `row_processor` 处理一个季度的批次

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::browser::ChromeLauncher;
use crate::config::Config;
use crate::error::{AppResult, BusinessError, ConfigError};
use crate::infrastructure::DriverLauncher;
use crate::models::{
    default_quarters, load_quarter_file, AutomationResult, FieldTable, QuarterDefinition,
    SubmissionResult, TimesheetEntry,
};
use crate::orchestrator::reconciler::Reconciler;
use crate::orchestrator::row_processor::run_automation;
use crate::services::{ProgressCallback, QuarterRouter, SessionController, TracingProgress, WarnWriter};
use crate::store::{EntryStore, StoreConfig};
use crate::utils::logging::{log_entries_loaded, log_startup, print_final_stats};
use crate::workflow::RowFlow;

/// 应用主结构
pub struct App {
    config: Config,
    store: EntryStore,
    launcher: Arc<dyn DriverLauncher>,
    router: QuarterRouter,
    fields: FieldTable,
    warn_writer: WarnWriter,
    progress: Arc<dyn ProgressCallback>,
    run_lock: Mutex<()>,
}

impl App {
    pub fn new(
        config: Config,
        store: EntryStore,
        launcher: Arc<dyn DriverLauncher>,
        quarters: Vec<QuarterDefinition>,
    ) -> Self {
        let warn_writer = WarnWriter::with_path(config.failure_log_file.clone());
        Self {
            config,
            store,
            launcher,
            router: QuarterRouter::new(quarters),
            fields: FieldTable::default(),
            warn_writer,
            progress: Arc::new(TracingProgress),
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// 按配置初始化：建库、加载季度表、使用 chromiumoxide 浏览器
    pub async fn initialize(config: Config) -> anyhow::Result<Self> {
        let store = EntryStore::new(StoreConfig::new(&config.db_path));
        store
            .initialize()
            .with_context(|| format!("初始化数据库失败: {}", config.db_path))?;

        let quarters = match &config.quarter_file {
            Some(path) => load_quarter_file(Path::new(path)).await?,
            None => default_quarters(),
        };

        let launcher = Arc::new(ChromeLauncher::from_config(&config));
        Ok(Self::new(config, store, launcher, quarters))
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn router(&self) -> &QuarterRouter {
        &self.router
    }

    /// 只处理配置中指定的季度时返回该季度
    fn pinned_quarter(&self) -> AppResult<Option<&QuarterDefinition>> {
        match &self.config.target_quarter {
            Some(id) => self
                .router
                .quarter_by_id(id)
                .map(Some)
                .ok_or_else(|| ConfigError::UnknownQuarter(id.clone()).into()),
            None => Ok(None),
        }
    }

    /// 提交全部待提交条目
    ///
    /// 同一时间只允许一次运行，并发调用立即返回 `SubmissionInProgress`。
    pub async fn submit_pending(&self) -> AppResult<SubmissionResult> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| BusinessError::SubmissionInProgress)?;

        let pinned = self.pinned_quarter()?;
        let entries = self.store.pending_entries()?;
        log_entries_loaded(entries.len());

        if entries.is_empty() {
            return Ok(SubmissionResult {
                ok: true,
                ..Default::default()
            });
        }

        let credentials = self
            .config
            .credentials
            .clone()
            .ok_or(ConfigError::MissingCredentials("SHEET_EMAIL / SHEET_PASSWORD"))?;

        let (groups, unroutable) = self.group_by_quarter(entries, pinned);
        let mut results = Vec::new();

        for (quarter, batch) in groups {
            log_startup(&quarter.window_label(), self.config.max_submit_attempts);
            let mut session = SessionController::new(
                Arc::clone(&self.launcher),
                quarter.destination.clone(),
                &self.fields,
                self.config.timeouts(),
            );
            let flow = RowFlow::new(&self.fields, &self.router, self.config.max_submit_attempts);
            let result = run_automation(
                &mut session,
                &flow,
                &batch,
                &credentials,
                self.progress.as_ref(),
            )
            .await;
            results.push(self.reconcile(&batch, &result)?);
        }

        if !unroutable.is_empty() {
            results.push(self.reject_unroutable(&unroutable)?);
        }

        let merged = merge_results(results);
        print_final_stats(
            merged.success_count,
            merged.removed_count,
            merged.total_processed,
            self.warn_writer.path(),
        );
        Ok(merged)
    }

    /// 按季度声明顺序分组；指定季度时其他季度的条目留待以后
    fn group_by_quarter<'a>(
        &'a self,
        entries: Vec<TimesheetEntry>,
        pinned: Option<&'a QuarterDefinition>,
    ) -> (Vec<(&'a QuarterDefinition, Vec<TimesheetEntry>)>, Vec<TimesheetEntry>) {
        let mut groups: Vec<(&QuarterDefinition, Vec<TimesheetEntry>)> = Vec::new();
        let mut unroutable = Vec::new();
        let mut deferred = 0;

        for entry in entries {
            let Some(quarter) = self.router.quarter_for_date(&entry.date) else {
                unroutable.push(entry);
                continue;
            };
            if pinned.is_some_and(|p| p.id != quarter.id) {
                deferred += 1;
                continue;
            }
            match groups.iter_mut().find(|(q, _)| q.id == quarter.id) {
                Some((_, batch)) => batch.push(entry),
                None => groups.push((quarter, vec![entry])),
            }
        }

        if deferred > 0 {
            info!("{} 条条目属于其他季度，本次不处理", deferred);
        }
        let order = |q: &QuarterDefinition| {
            self.router
                .quarters()
                .iter()
                .position(|d| d.id == q.id)
                .unwrap_or(usize::MAX)
        };
        groups.sort_by_key(|(q, _)| order(q));
        (groups, unroutable)
    }

    /// 不在任何季度内的条目无法提交，直接记为失败
    fn reject_unroutable(&self, entries: &[TimesheetEntry]) -> AppResult<SubmissionResult> {
        let mut result = AutomationResult {
            total_rows: entries.len(),
            ..Default::default()
        };
        for (index, entry) in entries.iter().enumerate() {
            let message = self
                .router
                .validate_availability(&entry.date)
                .unwrap_or_else(|| format!("No quarter for {}", entry.date));
            warn!("条目 {} 日期 {} 不在任何季度内", entry.id, entry.date);
            result.record_failure(index, message);
        }
        self.reconcile(entries, &result.finish())
    }

    fn reconcile(
        &self,
        entries: &[TimesheetEntry],
        result: &AutomationResult,
    ) -> AppResult<SubmissionResult> {
        Reconciler::new(&self.store, &self.warn_writer).reconcile(entries, result)
    }
}

/// 合并多个季度的结果
fn merge_results(results: Vec<SubmissionResult>) -> SubmissionResult {
    let mut merged = SubmissionResult::default();
    let mut errors = Vec::new();
    for r in results {
        merged.ok |= r.ok;
        merged.submitted_ids.extend(r.submitted_ids);
        merged.removed_ids.extend(r.removed_ids);
        merged.total_processed += r.total_processed;
        merged.success_count += r.success_count;
        merged.removed_count += r.removed_count;
        errors.extend(r.error);
    }
    if merged.total_processed == 0 {
        merged.ok = true;
    }
    if !errors.is_empty() {
        merged.error = Some(errors.join("; "));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_results() {
        let merged = merge_results(vec![
            SubmissionResult {
                ok: true,
                submitted_ids: vec![1],
                removed_ids: vec![2],
                total_processed: 2,
                success_count: 1,
                removed_count: 1,
                error: Some("1 entries failed and were removed".to_string()),
            },
            SubmissionResult {
                ok: false,
                submitted_ids: vec![],
                removed_ids: vec![3],
                total_processed: 1,
                success_count: 0,
                removed_count: 1,
                error: Some("Date must be in Q3 2025 (07/01-09/30)".to_string()),
            },
        ]);
        assert!(merged.ok);
        assert_eq!(merged.submitted_ids, vec![1]);
        assert_eq!(merged.removed_ids, vec![2, 3]);
        assert_eq!(merged.total_processed, 3);
        assert_eq!(
            merged.error.as_deref(),
            Some("1 entries failed and were removed; Date must be in Q3 2025 (07/01-09/30)")
        );
    }

    #[test]
    fn test_merge_empty_is_ok() {
        assert!(merge_results(Vec::new()).ok);
    }
}
