//! # Timesheet Submit
//!
//! 把本地待提交的工时记录自动填写并提交到按季度划分的网页表单
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器、Page），只暴露能力
//! - `AutomationDriver` / `DriverLauncher` - 驱动接口，测试中可替换
//! - `ChromeDriver` + `JsExecutor` - chromiumoxide 实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuarterRouter` - 日期 → 季度 → 提交目标
//! - `SessionController` - 登录、等待、填写、提交确认、恢复
//! - `WarnWriter` - 写失败条目记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行工时"的完整处理流程
//! - `RowCtx` - 上下文封装（行索引 + 条目 ID）
//! - `RowFlow` - 流程编排（校验 → 季度守卫 → 填写 → 提交 → 重试）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 提交任务入口，单飞保护、按季度分组
//! - `orchestrator/row_processor` - 单个季度的批次处理器
//! - `orchestrator/reconciler` - 结果回写数据库
//!
//! 存储（`store/`）只在运行前读取待提交集合、运行后回写结果时打开连接。

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::ChromeLauncher;
pub use config::{Config, Credentials, SessionTimeouts};
pub use error::{AppError, AppResult};
pub use infrastructure::{AutomationDriver, DriverLauncher, JsExecutor};
pub use models::{AutomationResult, QuarterDefinition, SubmissionResult, TimesheetEntry};
pub use orchestrator::{run_automation, App, Reconciler};
pub use services::{QuarterRouter, SessionController};
pub use store::{EntryStore, StoreConfig};
pub use workflow::{RowCtx, RowError, RowFlow, RowOutcome};
