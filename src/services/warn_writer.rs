//! 失败条目记录 - 业务能力层
//!
//! 失败的条目会从数据库永久删除，删除前先把它们写进纯文本记录，
//! 操作员事后可以据此手工补录。

use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::models::TimesheetEntry;

/// 失败条目写入服务
///
/// 只负责追加写文件，不关心流程顺序。
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用默认文件 `failed_entries.txt`
    pub fn new() -> Self {
        Self::with_path("failed_entries.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 追加一条失败记录
    pub fn write(&self, entry: &TimesheetEntry, reason: &str) -> std::io::Result<()> {
        debug!("写入失败记录: 条目 {} | 原因: {}", entry.id, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)?;

        let line = format!(
            "{} | 条目 {} | {} | {} | {} | 原因: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            entry.id,
            entry.date,
            entry.project,
            entry.task_description.replace('\n', " "),
            reason.replace('\n', " ")
        );

        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
