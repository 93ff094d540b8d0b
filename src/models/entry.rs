use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 条目状态
///
/// 数据库中 `status IS NULL` 表示 Pending，`'Complete'` 表示已提交。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Pending,
    Submitted,
}

impl EntryStatus {
    /// 写入数据库的值
    pub fn as_db_str(self) -> Option<&'static str> {
        match self {
            EntryStatus::Pending => None,
            EntryStatus::Submitted => Some("Complete"),
        }
    }

    /// 从数据库列解析
    pub fn from_db(value: Option<&str>) -> Option<Self> {
        match value {
            None => Some(EntryStatus::Pending),
            Some("Complete") => Some(EntryStatus::Submitted),
            Some(_) => None,
        }
    }
}

/// 工时条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetEntry {
    pub id: i64,
    /// `YYYY-MM-DD`，按持久化的原文保存
    pub date: String,
    /// 距当日零点的分钟数
    pub time_in: u32,
    pub time_out: u32,
    pub project: String,
    pub tool: Option<String>,
    pub charge_code: Option<String>,
    pub task_description: String,
    pub status: EntryStatus,
    pub submitted_at: Option<String>,
}

/// 待写入的新条目（id 由存储层分配）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub date: String,
    pub time_in: u32,
    pub time_out: u32,
    pub project: String,
    pub tool: Option<String>,
    pub charge_code: Option<String>,
    pub task_description: String,
}

// 列名即 FieldSpec 的 source label
pub const COL_PROJECT: &str = "Project";
pub const COL_DATE: &str = "Date";
pub const COL_HOURS: &str = "Hours";
pub const COL_TOOL: &str = "Tool";
pub const COL_CHARGE_CODE: &str = "Detail Charge Code";
pub const COL_DESCRIPTION: &str = "Task Description";

impl TimesheetEntry {
    pub fn is_submitted(&self) -> bool {
        self.status == EntryStatus::Submitted
    }

    /// 工时，保留两位小数；结束早于开始时返回 None
    pub fn hours(&self) -> Option<String> {
        if self.time_out <= self.time_in {
            return None;
        }
        let minutes = self.time_out - self.time_in;
        Some(format!("{:.2}", minutes as f64 / 60.0))
    }

    /// 表单日期格式 `MM/DD/YYYY`，无法解析时原样返回
    pub fn form_date(&self) -> String {
        match NaiveDate::parse_from_str(&self.date, "%Y-%m-%d") {
            Ok(d) => d.format("%m/%d/%Y").to_string(),
            Err(_) => self.date.clone(),
        }
    }

    /// 以列名为键的表格视图，缺失的可选列直接省略
    pub fn columns(&self) -> BTreeMap<&'static str, String> {
        let mut cols = BTreeMap::new();
        cols.insert(COL_PROJECT, self.project.clone());
        cols.insert(COL_DATE, self.form_date());
        if let Some(hours) = self.hours() {
            cols.insert(COL_HOURS, hours);
        }
        if let Some(tool) = &self.tool {
            cols.insert(COL_TOOL, tool.clone());
        }
        if let Some(code) = &self.charge_code {
            cols.insert(COL_CHARGE_CODE, code.clone());
        }
        cols.insert(COL_DESCRIPTION, self.task_description.clone());
        cols
    }
}
