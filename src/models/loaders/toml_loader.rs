use crate::models::quarter::QuarterDefinition;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 季度文件结构
///
/// ```toml
/// [[quarter]]
/// id = "Q1-2026"
/// label = "Q1 2026"
/// start_date = "2026-01-01"
/// end_date = "2026-03-31"
///
/// [quarter.destination]
/// base_url = "https://app.smartsheet.com/b/form"
/// submit_base_url = "https://forms.smartsheet.com/api/submit"
/// form_id = "..."
/// success_patterns = ["**/api/submit/...*"]
/// ```
#[derive(Debug, Deserialize)]
struct QuarterFile {
    #[serde(default, rename = "quarter")]
    quarters: Vec<QuarterDefinition>,
}

/// 从 TOML 文本解析季度表
pub fn parse_quarters(content: &str) -> Result<Vec<QuarterDefinition>> {
    let file: QuarterFile = toml::from_str(content).context("无法解析季度定义")?;

    for q in &file.quarters {
        if q.end_date < q.start_date {
            anyhow::bail!("季度 {} 的结束日期早于开始日期", q.id);
        }
    }

    Ok(file.quarters)
}

/// 从 TOML 文件加载季度表
pub async fn load_quarter_file(path: &Path) -> Result<Vec<QuarterDefinition>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取季度文件: {}", path.display()))?;

    let quarters =
        parse_quarters(&content).with_context(|| format!("季度文件无效: {}", path.display()))?;

    tracing::info!(
        "已加载 {} 个季度定义: {}",
        quarters.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(quarters)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[quarter]]
id = "Q1-2026"
label = "Q1 2026"
start_date = "2026-01-01"
end_date = "2026-03-31"

[quarter.destination]
base_url = "https://app.smartsheet.com/b/form"
submit_base_url = "https://forms.smartsheet.com/api/submit"
form_id = "q1-2026"
success_patterns = ["**/api/submit/q1-2026*"]
"#;

    #[test]
    fn test_parse_quarters() {
        let quarters = parse_quarters(SAMPLE).unwrap();
        assert_eq!(quarters.len(), 1);
        assert_eq!(quarters[0].id, "Q1-2026");
        assert_eq!(quarters[0].destination.form_id, "q1-2026");
        assert_eq!(
            quarters[0].start_date,
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_reversed_range_rejected() {
        let bad = SAMPLE.replace("2026-03-31", "2025-12-01");
        assert!(parse_quarters(&bad).is_err());
    }

    #[tokio::test]
    async fn test_load_quarter_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarters.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let quarters = load_quarter_file(&path).await.unwrap();
        assert_eq!(quarters[0].label, "Q1 2026");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = load_quarter_file(Path::new("/definitely/not/here.toml")).await;
        assert!(result.is_err());
    }
}
