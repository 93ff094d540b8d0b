//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和结果回写，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 提交任务入口
//! - 管理应用资源（存储、浏览器获取方式、季度表）
//! - 单飞保护，按季度分组
//! - 输出全局统计信息
//!
//! ### `row_processor` - 单个季度的批次处理器
//! - 会话生命周期（启动、登录、关闭）
//! - 遍历条目（`Vec<TimesheetEntry>`），复用同一个 `RowFlow`
//! - 单行失败后恢复会话并继续
//!
//! ### `reconciler` - 结果回写
//! - 成功 → 已提交；失败 → 记录后删除；未处理 → 保持待提交
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理全部待提交条目)
//!     ↓
//! row_processor (处理一个季度的 Vec<TimesheetEntry>)
//!     ↓
//! workflow::RowFlow (处理单行)
//!     ↓
//! services (能力层：router / session / progress / warn)
//!     ↓
//! infrastructure (基础设施：AutomationDriver)
//! ```

pub mod batch_processor;
pub mod reconciler;
pub mod row_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use reconciler::Reconciler;
pub use row_processor::run_automation;
