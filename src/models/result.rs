use serde::{Deserialize, Serialize};

/// 一次自动化运行的汇总结果
///
/// `ok` 的定义是"至少提交成功一行"，并非"零失败"。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationResult {
    pub ok: bool,
    /// 提交成功的行索引
    pub submitted_indices: Vec<usize>,
    /// (行索引, 错误信息)
    pub errors: Vec<(usize, String)>,
    pub total_rows: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// 行循环之外的致命错误（例如登录失败）
    pub fatal_error: Option<String>,
}

impl AutomationResult {
    /// 空运行
    pub fn empty() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    /// 致命错误：所有行以同一条信息记为失败
    pub fn aborted(total_rows: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            ok: false,
            submitted_indices: Vec::new(),
            errors: (0..total_rows).map(|i| (i, message.clone())).collect(),
            total_rows,
            success_count: 0,
            failure_count: total_rows,
            fatal_error: Some(message),
        }
    }

    pub fn record_success(&mut self, index: usize) {
        self.submitted_indices.push(index);
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, index: usize, message: impl Into<String>) {
        self.errors.push((index, message.into()));
        self.failure_count += 1;
    }

    /// 收尾：按宽松定义计算 ok
    pub fn finish(mut self) -> Self {
        self.ok = self.success_count > 0;
        self
    }

    pub fn error_for(&self, index: usize) -> Option<&str> {
        self.errors
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, m)| m.as_str())
    }
}

/// 返回给调用方的提交结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub ok: bool,
    pub submitted_ids: Vec<i64>,
    pub removed_ids: Vec<i64>,
    pub total_processed: usize,
    pub success_count: usize,
    pub removed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
