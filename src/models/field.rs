//! 表单字段表
//!
//! 逻辑字段 → {来源列名, 定位策略, 类型}。Tool 字段的 DOM 形状随所选项目变化，
//! 因此额外带一张按项目名索引的定位覆盖表。

use phf::phf_map;
use std::collections::HashMap;

use crate::models::entry::{
    COL_CHARGE_CODE, COL_DATE, COL_DESCRIPTION, COL_HOURS, COL_PROJECT, COL_TOOL,
};

/// 元素定位策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorStrategy {
    /// 原样的 CSS 选择器
    Css(String),
    /// `aria-label` 精确匹配
    AriaLabel(String),
    /// `aria-label` 包含
    AriaLabelContains(String),
    /// 输入框 placeholder
    Placeholder(String),
    /// 按可访问名称匹配的文本框
    Textbox(String),
}

impl LocatorStrategy {
    /// 渲染为驱动使用的 CSS 选择器
    pub fn to_css(&self) -> String {
        match self {
            LocatorStrategy::Css(css) => css.clone(),
            LocatorStrategy::AriaLabel(label) => format!("input[aria-label='{}']", label),
            LocatorStrategy::AriaLabelContains(label) => format!("input[aria-label*='{}']", label),
            LocatorStrategy::Placeholder(text) => format!("input[placeholder='{}']", text),
            LocatorStrategy::Textbox(name) => format!(
                "textarea[aria-label='{0}'], [role='textbox'][aria-label='{0}']",
                name
            ),
        }
    }
}

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    /// 输入后需要 ArrowDown + Enter 确认的下拉框
    Dropdown,
}

/// 单个字段的定义
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub key: &'static str,
    pub source_label: &'static str,
    pub locator: LocatorStrategy,
    pub field_type: FieldType,
    pub optional: bool,
    /// 项目名 → 定位覆盖
    pub locator_overrides: HashMap<String, LocatorStrategy>,
}

impl FieldSpec {
    fn new(
        key: &'static str,
        source_label: &'static str,
        locator: LocatorStrategy,
        field_type: FieldType,
        optional: bool,
    ) -> Self {
        Self {
            key,
            source_label,
            locator,
            field_type,
            optional,
            locator_overrides: HashMap::new(),
        }
    }

    /// 按项目解析定位：有覆盖用覆盖，否则回退默认定位
    pub fn locator_for(&self, project: Option<&str>) -> &LocatorStrategy {
        project
            .and_then(|p| self.locator_overrides.get(p.trim()))
            .unwrap_or(&self.locator)
    }
}

/// 不同项目下 Tool 字段的 aria-label
static TOOL_LOCATOR_OVERRIDES: phf::Map<&'static str, &'static str> = phf_map! {
    "FL-Carver Techs" => "input[aria-label='Tool (FL-Carver Techs)']",
    "FL-Carver Tools" => "input[aria-label='Tool (FL-Carver Tools)']",
    "OSC-BBB" => "input[aria-label='Tool (OSC-BBB)']",
    "SWFL-CHEM/GAS" => "input[aria-label='Tool (SWFL-CHEM/GAS)']",
    "SWFL-EQUIP" => "input[aria-label='Tool (SWFL-EQUIP)']",
};

/// 字段键
pub const FIELD_PROJECT: &str = "project_code";
pub const FIELD_DATE: &str = "date";
pub const FIELD_HOURS: &str = "hours";
pub const FIELD_TOOL: &str = "tool";
pub const FIELD_DESCRIPTION: &str = "task_description";
pub const FIELD_CHARGE_CODE: &str = "detail_code";

/// 必填字段（时长、项目、日期）
pub const REQUIRED_FIELDS: [&str; 3] = [FIELD_HOURS, FIELD_PROJECT, FIELD_DATE];

/// 表格导入源遗留下来的"缺失"标记
pub fn is_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("nan") || v.eq_ignore_ascii_case("none")
}

/// 按填写顺序排列的字段表
///
/// 顺序敏感：先选项目，Tool 字段背后的 DOM 元素才会确定。
#[derive(Debug, Clone)]
pub struct FieldTable {
    fields: Vec<FieldSpec>,
}

impl FieldTable {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// 登录完成的落地信号：项目字段出现
    pub fn landing_locator(&self) -> Option<&LocatorStrategy> {
        self.get(FIELD_PROJECT).map(|f| &f.locator)
    }

    /// 从行数据构建 字段键 → 值；行中缺失的列直接省略
    pub fn build_field_map(
        &self,
        columns: &std::collections::BTreeMap<&'static str, String>,
    ) -> Vec<(&FieldSpec, String)> {
        self.fields
            .iter()
            .filter_map(|spec| {
                columns
                    .get(spec.source_label)
                    .map(|value| (spec, value.clone()))
            })
            .collect()
    }
}

impl Default for FieldTable {
    fn default() -> Self {
        let mut tool = FieldSpec::new(
            FIELD_TOOL,
            COL_TOOL,
            LocatorStrategy::AriaLabelContains("Tool".to_string()),
            FieldType::Dropdown,
            true,
        );
        tool.locator_overrides = TOOL_LOCATOR_OVERRIDES
            .entries()
            .map(|(project, css)| (project.to_string(), LocatorStrategy::Css(css.to_string())))
            .collect();

        Self::new(vec![
            FieldSpec::new(
                FIELD_PROJECT,
                COL_PROJECT,
                LocatorStrategy::AriaLabel("Project".to_string()),
                FieldType::Dropdown,
                false,
            ),
            FieldSpec::new(
                FIELD_DATE,
                COL_DATE,
                LocatorStrategy::Placeholder("mm/dd/yyyy".to_string()),
                FieldType::Text,
                false,
            ),
            FieldSpec::new(
                FIELD_HOURS,
                COL_HOURS,
                LocatorStrategy::AriaLabel("Hours".to_string()),
                FieldType::Text,
                false,
            ),
            tool,
            FieldSpec::new(
                FIELD_DESCRIPTION,
                COL_DESCRIPTION,
                LocatorStrategy::Textbox("Task Description".to_string()),
                FieldType::Text,
                false,
            ),
            FieldSpec::new(
                FIELD_CHARGE_CODE,
                COL_CHARGE_CODE,
                LocatorStrategy::AriaLabel("Detail Charge Code".to_string()),
                FieldType::Dropdown,
                true,
            ),
        ])
    }
}
