//! 单行处理流程 - 流程层
//!
//! 核心职责：定义"一行工时"的完整处理流程
//!
//! 流程顺序：
//! 1. 已提交 → 跳过
//! 2. 构建字段映射 → 校验必填字段（不重试）
//! 3. 季度路由守卫：条目所属季度的表单必须就是会话正在提交的表单，
//!    不匹配时一个字段都不碰
//! 4. 等待表单就绪 → 填写全部字段 → 提交，未确认则整行重填重试

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::models::field::{is_sentinel, FieldSpec, FieldTable, REQUIRED_FIELDS};
use crate::models::{DestinationIdentity, TimesheetEntry};
use crate::services::{QuarterRouter, SessionController};
use crate::workflow::row_ctx::RowCtx;

/// 行处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// 提交成功，附带实际尝试次数
    Submitted { attempts: u32 },
    /// 条目已是已提交状态
    AlreadySubmitted,
}

/// 行级错误
#[derive(Debug, Error)]
pub enum RowError {
    /// 必填字段缺失，不重试
    #[error("Missing required field(s): {}", .0.join(", "))]
    Validation(Vec<String>),
    /// 条目属于其他季度
    #[error("Quarter mismatch: entry dated {date} belongs to {entry_quarter} but this session submits to {session_quarter}")]
    QuarterMismatch {
        date: String,
        entry_quarter: String,
        session_quarter: String,
    },
    /// 条目日期不在任何季度内
    #[error("{0}")]
    NoQuarter(String),
    /// 重试耗尽
    #[error("Submission not confirmed after {attempts} attempts")]
    NotConfirmed { attempts: u32 },
    /// 页面 / 导航错误，需要恢复会话
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl RowError {
    /// 是否需要在继续下一行之前恢复会话
    pub fn needs_recovery(&self) -> bool {
        matches!(self, RowError::Session(_) | RowError::NotConfirmed { .. })
    }
}

/// 单行处理流程
///
/// - 不持有任何资源（会话由调用方传入）
/// - 提交目标以会话的目标表单为准
pub struct RowFlow<'a> {
    fields: &'a FieldTable,
    router: &'a QuarterRouter,
    max_attempts: u32,
}

impl<'a> RowFlow<'a> {
    pub fn new(fields: &'a FieldTable, router: &'a QuarterRouter, max_attempts: u32) -> Self {
        Self {
            fields,
            router,
            max_attempts: max_attempts.max(1),
        }
    }

    /// 构建字段映射并完成所有不接触页面的校验
    ///
    /// `destination` 是会话实际提交的表单。
    pub fn prepare(
        &self,
        entry: &TimesheetEntry,
        destination: &DestinationIdentity,
    ) -> Result<Vec<(&'a FieldSpec, String)>, RowError> {
        let columns = entry.columns();
        let field_map = self.fields.build_field_map(&columns);

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|key| {
                field_map
                    .iter()
                    .find(|(spec, _)| spec.key == **key)
                    .map_or(true, |(_, value)| is_sentinel(value))
            })
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RowError::Validation(missing));
        }

        self.guard_quarter(entry, destination)?;
        Ok(field_map)
    }

    fn guard_quarter(
        &self,
        entry: &TimesheetEntry,
        destination: &DestinationIdentity,
    ) -> Result<(), RowError> {
        match self.router.quarter_for_date(&entry.date) {
            None => Err(RowError::NoQuarter(
                self.router
                    .validate_availability(&entry.date)
                    .unwrap_or_else(|| format!("No quarter for {}", entry.date)),
            )),
            Some(q) if !q.destination.same_target(destination) => Err(RowError::QuarterMismatch {
                date: entry.date.clone(),
                entry_quarter: q.label.clone(),
                session_quarter: self.destination_label(destination),
            }),
            Some(_) => Ok(()),
        }
    }

    /// 目标表单对应的季度名；不在季度表里时用表单地址
    fn destination_label(&self, destination: &DestinationIdentity) -> String {
        self.router
            .quarters()
            .iter()
            .find(|q| q.destination.same_target(destination))
            .map(|q| q.label.clone())
            .unwrap_or_else(|| destination.form_url())
    }

    pub async fn run(
        &self,
        session: &mut SessionController,
        entry: &TimesheetEntry,
        ctx: &RowCtx,
    ) -> Result<RowOutcome, RowError> {
        if entry.is_submitted() {
            info!("{} 已提交，跳过", ctx);
            return Ok(RowOutcome::AlreadySubmitted);
        }

        let field_map = self.prepare(entry, session.destination())?;
        info!(
            "{} 📝 {} | {}",
            ctx,
            entry.project,
            crate::utils::logging::truncate_text(&entry.task_description, 40)
        );

        for attempt in 1..=self.max_attempts {
            if attempt > 1 && session.confirm_late_submission().await? {
                info!("{} ✓ 第 {} 次提交在超时后确认", ctx, attempt - 1);
                return Ok(RowOutcome::Submitted {
                    attempts: attempt - 1,
                });
            }
            session.wait_for_form_ready().await?;
            self.inject_all(session, &field_map, &entry.project, ctx).await?;

            if session.submit().await? {
                info!("{} ✓ 提交成功 (第 {} 次尝试)", ctx, attempt);
                return Ok(RowOutcome::Submitted { attempts: attempt });
            }
            warn!(
                "{} ⚠️ 第 {}/{} 次提交未确认",
                ctx, attempt, self.max_attempts
            );
        }

        if session.confirm_late_submission().await? {
            info!("{} ✓ 最后一次提交在超时后确认", ctx);
            return Ok(RowOutcome::Submitted {
                attempts: self.max_attempts,
            });
        }
        Err(RowError::NotConfirmed {
            attempts: self.max_attempts,
        })
    }

    /// 按字段表顺序填写；空值和缺失标记跳过，可选字段失败只告警
    async fn inject_all(
        &self,
        session: &mut SessionController,
        field_map: &[(&FieldSpec, String)],
        project: &str,
        ctx: &RowCtx,
    ) -> Result<(), RowError> {
        for (spec, value) in field_map {
            if is_sentinel(value) {
                debug!("{} 字段 {} 为空，跳过", ctx, spec.key);
                continue;
            }
            match session.inject_field(spec, value, Some(project)).await {
                Ok(()) => {}
                Err(e) if spec.optional => {
                    warn!("{} 可选字段 {} 填写失败，跳过: {}", ctx, spec.key, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
