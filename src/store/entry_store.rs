//! SQLite 工时条目存储
//!
//! 每个逻辑操作单独打开连接，浏览器运行期间不持有连接。

use std::path::{Path, PathBuf};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::{EntryStatus, NewEntry, TimesheetEntry};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS timesheet (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    time_in INTEGER NOT NULL,
    time_out INTEGER NOT NULL,
    project TEXT NOT NULL,
    tool TEXT,
    detail_charge_code TEXT,
    task_description TEXT NOT NULL,
    status TEXT DEFAULT NULL,
    submitted_at TEXT DEFAULT NULL,
    UNIQUE(date, time_in, project, task_description)
);
CREATE INDEX IF NOT EXISTS idx_timesheet_status ON timesheet(status);
";

const SELECT_COLUMNS: &str = "id, date, time_in, time_out, project, tool, detail_charge_code, \
     task_description, status, submitted_at";

/// 存储配置：显式传入数据库路径
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

/// 数据库行的原始形态，状态列在外面再解析
struct RawRow {
    entry: TimesheetEntry,
    status: Option<String>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        entry: TimesheetEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            time_in: row.get(2)?,
            time_out: row.get(3)?,
            project: row.get(4)?,
            tool: row.get(5)?,
            charge_code: row.get(6)?,
            task_description: row.get(7)?,
            status: EntryStatus::Pending,
            submitted_at: row.get(9)?,
        },
        status: row.get(8)?,
    })
}

fn finish_row(raw: RawRow) -> StoreResult<TimesheetEntry> {
    let RawRow { mut entry, status } = raw;
    entry.status = EntryStatus::from_db(status.as_deref()).ok_or_else(|| StoreError::CorruptRow {
        id: entry.id,
        message: format!("unknown status {:?}", status),
    })?;
    Ok(entry)
}

/// 工时条目存储
#[derive(Debug, Clone)]
pub struct EntryStore {
    config: StoreConfig,
}

impl EntryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.db_path
    }

    fn connect(&self) -> StoreResult<Connection> {
        Ok(Connection::open(&self.config.db_path)?)
    }

    /// 建库建表，启动时调用一次
    pub fn initialize(&self) -> StoreResult<()> {
        if let Some(parent) = self.config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Path {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        debug!("数据库已就绪: {}", self.config.db_path.display());
        Ok(())
    }

    /// 插入新条目；与已有条目重复时返回 `None`
    pub fn insert_entry(&self, entry: &NewEntry) -> StoreResult<Option<i64>> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO timesheet
                (date, time_in, time_out, project, tool, detail_charge_code, task_description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.date,
                entry.time_in,
                entry.time_out,
                entry.project,
                entry.tool,
                entry.charge_code,
                entry.task_description,
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    /// 待提交条目，按日期、开始时间排序
    pub fn pending_entries(&self) -> StoreResult<Vec<TimesheetEntry>> {
        self.query_entries(&format!(
            "SELECT {} FROM timesheet WHERE status IS NULL ORDER BY date ASC, time_in ASC",
            SELECT_COLUMNS
        ))
    }

    pub fn all_entries(&self) -> StoreResult<Vec<TimesheetEntry>> {
        self.query_entries(&format!(
            "SELECT {} FROM timesheet ORDER BY date ASC, time_in ASC",
            SELECT_COLUMNS
        ))
    }

    pub fn get_entry(&self, id: i64) -> StoreResult<Option<TimesheetEntry>> {
        let conn = self.connect()?;
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM timesheet WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                read_row,
            )
            .optional()?;
        raw.map(finish_row).transpose()
    }

    /// 批量标记为已提交，单个事务
    pub fn mark_submitted(&self, ids: &[i64], submitted_at: &str) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut changed = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE timesheet SET status = ?1, submitted_at = ?2 WHERE id = ?3 AND status IS NULL",
            )?;
            for id in ids {
                changed += stmt.execute(params![
                    EntryStatus::Submitted.as_db_str(),
                    submitted_at,
                    id
                ])?;
            }
        }
        tx.commit()?;
        Ok(changed)
    }

    /// 批量删除，单个事务
    pub fn delete_entries(&self, ids: &[i64]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let changed = tx.execute(
            &format!("DELETE FROM timesheet WHERE id IN ({})", placeholders),
            params_from_iter(ids.iter()),
        )?;
        tx.commit()?;
        Ok(changed)
    }

    fn query_entries(&self, sql: &str) -> StoreResult<Vec<TimesheetEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let raws = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(finish_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(date: &str, time_in: u32, project: &str) -> NewEntry {
        NewEntry {
            date: date.to_string(),
            time_in,
            time_out: time_in + 60,
            project: project.to_string(),
            tool: None,
            charge_code: None,
            task_description: format!("work on {}", project),
        }
    }

    fn store() -> (tempfile::TempDir, EntryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(StoreConfig::new(dir.path().join("nested/db.sqlite")));
        store.initialize().unwrap();
        (dir, store)
    }

    #[test]
    fn test_pending_ordered_by_date_then_start() {
        let (_dir, store) = store();
        store.insert_entry(&new_entry("2025-07-16", 480, "B")).unwrap();
        store.insert_entry(&new_entry("2025-07-15", 600, "A")).unwrap();
        store.insert_entry(&new_entry("2025-07-15", 480, "C")).unwrap();

        let pending = store.pending_entries().unwrap();
        let order: Vec<(&str, u32)> = pending.iter().map(|e| (e.date.as_str(), e.time_in)).collect();
        assert_eq!(
            order,
            vec![("2025-07-15", 480), ("2025-07-15", 600), ("2025-07-16", 480)]
        );
    }

    #[test]
    fn test_duplicate_insert_ignored() {
        let (_dir, store) = store();
        assert!(store.insert_entry(&new_entry("2025-07-15", 480, "A")).unwrap().is_some());
        assert!(store.insert_entry(&new_entry("2025-07-15", 480, "A")).unwrap().is_none());
        assert_eq!(store.all_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_mark_submitted_and_delete() {
        let (_dir, store) = store();
        let a = store.insert_entry(&new_entry("2025-07-15", 480, "A")).unwrap().unwrap();
        let b = store.insert_entry(&new_entry("2025-07-15", 600, "B")).unwrap().unwrap();
        let c = store.insert_entry(&new_entry("2025-07-15", 720, "C")).unwrap().unwrap();

        assert_eq!(store.mark_submitted(&[a], "2025-07-20 10:00:00").unwrap(), 1);
        assert_eq!(store.delete_entries(&[b]).unwrap(), 1);

        let submitted = store.get_entry(a).unwrap().unwrap();
        assert_eq!(submitted.status, EntryStatus::Submitted);
        assert_eq!(submitted.submitted_at.as_deref(), Some("2025-07-20 10:00:00"));
        assert!(store.get_entry(b).unwrap().is_none());

        let pending: Vec<i64> = store.pending_entries().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(pending, vec![c]);

        // 已提交的条目不会被再次标记
        assert_eq!(store.mark_submitted(&[a], "2025-07-21 10:00:00").unwrap(), 0);
    }

    #[test]
    fn test_empty_id_lists_are_noops() {
        let (_dir, store) = store();
        assert_eq!(store.mark_submitted(&[], "x").unwrap(), 0);
        assert_eq!(store.delete_entries(&[]).unwrap(), 0);
    }
}
