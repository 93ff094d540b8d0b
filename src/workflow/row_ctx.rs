//! 行处理上下文
//!
//! 封装"我正在处理批次中的第几行、哪一条工时记录"这一信息

use std::fmt::Display;

use crate::models::TimesheetEntry;

/// 行处理上下文
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 行在本批次中的索引（从0开始）
    pub row_index: usize,

    /// 本批次总行数（仅用于日志显示）
    pub total_rows: usize,

    /// 条目ID
    pub entry_id: i64,

    /// 条目日期
    pub date: String,
}

impl RowCtx {
    pub fn new(row_index: usize, total_rows: usize, entry: &TimesheetEntry) -> Self {
        Self {
            row_index,
            total_rows,
            entry_id: entry.id,
            date: entry.date.clone(),
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[行 {}/{} 条目 ID#{} 日期#{}]",
            self.row_index + 1,
            self.total_rows,
            self.entry_id,
            self.date
        )
    }
}
