//! Shared test helpers

#![allow(dead_code)]

pub mod mock_driver;

use std::sync::Arc;
use std::time::Duration;

use timesheet_submit::config::{Config, Credentials, SessionTimeouts};
use timesheet_submit::models::{EntryStatus, FieldTable, NewEntry, QuarterDefinition, TimesheetEntry};
use timesheet_submit::services::{QuarterRouter, SessionController};
use timesheet_submit::store::{EntryStore, StoreConfig};

pub use mock_driver::{DriverCall, MockLauncher, MockState, CONFIRMATION_URL};

/// 测试用的短等待参数
pub fn fast_timeouts() -> SessionTimeouts {
    SessionTimeouts {
        global: Duration::from_millis(200),
        poll_interval: Duration::from_millis(1),
        stable_window: Duration::from_millis(5),
        submit: Duration::from_millis(20),
        navigation_retries: 2,
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        email: "tester@example.com".to_string(),
        password: "secret".to_string(),
    }
}

/// 1 小时的待提交条目
pub fn entry(id: i64, date: &str, project: &str) -> TimesheetEntry {
    TimesheetEntry {
        id,
        date: date.to_string(),
        time_in: 540,
        time_out: 600,
        project: project.to_string(),
        tool: None,
        charge_code: None,
        task_description: format!("Task {}", id),
        status: EntryStatus::Pending,
        submitted_at: None,
    }
}

pub fn new_entry(date: &str, time_in: u32, project: &str) -> NewEntry {
    NewEntry {
        date: date.to_string(),
        time_in,
        time_out: time_in + 60,
        project: project.to_string(),
        tool: None,
        charge_code: None,
        task_description: format!("Work {} {}", date, time_in),
    }
}

pub fn quarter(router: &QuarterRouter, id: &str) -> QuarterDefinition {
    router.quarter_by_id(id).unwrap().clone()
}

/// 面向指定季度、使用假驱动的会话
pub fn session_for(state: &Arc<MockState>, quarter: &QuarterDefinition) -> SessionController {
    SessionController::new(
        Arc::new(MockLauncher::new(Arc::clone(state))),
        quarter.destination.clone(),
        &FieldTable::default(),
        fast_timeouts(),
    )
}

/// 临时目录里的已初始化数据库
pub fn temp_store() -> (tempfile::TempDir, EntryStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = EntryStore::new(StoreConfig::new(dir.path().join("timesheet.sqlite")));
    store.initialize().unwrap();
    (dir, store)
}

/// 与 `fast_timeouts` 对应的配置
pub fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        db_path: dir.path().join("timesheet.sqlite").display().to_string(),
        failure_log_file: dir.path().join("failed_entries.txt").display().to_string(),
        output_log_file: dir.path().join("run.log").display().to_string(),
        global_timeout_ms: 200,
        poll_interval_ms: 1,
        dom_stable_window_ms: 5,
        submit_timeout_ms: 20,
        navigation_retries: 2,
        credentials: Some(credentials()),
        ..Config::default()
    }
}
