//! 季度定义与目标表单
//!
//! 新增季度只需要在 `default_quarters()` 里追加一条记录，
//! 或在季度 TOML 文件中加一个 `[[quarter]]`，路由逻辑无需改动。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const SMARTSHEET_FORM_BASE: &str = "https://app.smartsheet.com/b/form";
const SMARTSHEET_SUBMIT_BASE: &str = "https://forms.smartsheet.com/api/submit";

/// 远端表单的身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationIdentity {
    /// 表单基础地址，表单页 = base_url/form_id
    pub base_url: String,
    /// 提交接口基础地址，提交端点 = submit_base_url/form_id
    pub submit_base_url: String,
    pub form_id: String,
    /// 提交后可接受的落地 URL（glob）
    #[serde(default)]
    pub success_patterns: Vec<String>,
}

impl DestinationIdentity {
    /// Smartsheet 表单的标准目标
    pub fn smartsheet(form_id: &str) -> Self {
        Self {
            base_url: SMARTSHEET_FORM_BASE.to_string(),
            submit_base_url: SMARTSHEET_SUBMIT_BASE.to_string(),
            form_id: form_id.to_string(),
            success_patterns: vec![
                format!("**/api/submit/{}*", form_id),
                format!("**/b/form/{}/confirmation*", form_id),
                "**/b/form/*/thank*".to_string(),
            ],
        }
    }

    /// 表单页地址
    pub fn form_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.form_id)
    }

    /// 计算得到的提交端点
    pub fn submission_endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.submit_base_url.trim_end_matches('/'),
            self.form_id
        )
    }

    /// 是否指向同一张表单
    pub fn same_target(&self, other: &DestinationIdentity) -> bool {
        self.form_id == other.form_id
            && self.base_url.trim_end_matches('/') == other.base_url.trim_end_matches('/')
    }
}

/// 季度定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterDefinition {
    /// 例如 `Q3-2025`
    pub id: String,
    /// 例如 `Q3 2025`
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub destination: DestinationIdentity,
}

impl QuarterDefinition {
    /// 闭区间包含判断
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// 用于提示信息的窗口描述，例如 `Q3 2025 (07/01-09/30)`
    pub fn window_label(&self) -> String {
        format!(
            "{} ({}-{})",
            self.label,
            self.start_date.format("%m/%d"),
            self.end_date.format("%m/%d")
        )
    }

    pub fn overlaps(&self, other: &QuarterDefinition) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    // 常量日期，构造失败只可能是表格写错
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn quarter(id: &str, label: &str, start: NaiveDate, end: NaiveDate, form_id: &str) -> QuarterDefinition {
    QuarterDefinition {
        id: id.to_string(),
        label: label.to_string(),
        start_date: start,
        end_date: end,
        destination: DestinationIdentity::smartsheet(form_id),
    }
}

/// 内置季度表
pub fn default_quarters() -> Vec<QuarterDefinition> {
    vec![
        quarter(
            "Q1-2025",
            "Q1 2025",
            ymd(2025, 1, 1),
            ymd(2025, 3, 31),
            "q1-2025-placeholder",
        ),
        quarter(
            "Q2-2025",
            "Q2 2025",
            ymd(2025, 4, 1),
            ymd(2025, 6, 30),
            "q2-2025-placeholder",
        ),
        quarter(
            "Q3-2025",
            "Q3 2025",
            ymd(2025, 7, 1),
            ymd(2025, 9, 30),
            "0197cbae7daf72bdb96b3395b500d414",
        ),
        quarter(
            "Q4-2025",
            "Q4 2025",
            ymd(2025, 10, 1),
            ymd(2025, 12, 31),
            "0199fabee6497e60abb6030c48d84585",
        ),
    ]
}
