//! 季度路由 - 业务能力层
//!
//! 日期 → 季度 → 提交目标。纯函数，不做 I/O。

use chrono::NaiveDate;
use tracing::warn;

use crate::models::QuarterDefinition;

/// 季度路由表
///
/// 按声明顺序线性扫描，第一个包含该日期的季度胜出。
#[derive(Debug, Clone)]
pub struct QuarterRouter {
    quarters: Vec<QuarterDefinition>,
}

/// 严格解析 `YYYY-MM-DD`
///
/// 只接受 4-2-2 位数字；日历上不存在的日期（如非闰年 2 月 29 日）返回 `None`。
pub fn parse_strict_date(date: &str) -> Option<NaiveDate> {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

impl QuarterRouter {
    /// 创建路由表；声明重叠时记录告警
    pub fn new(quarters: Vec<QuarterDefinition>) -> Self {
        let router = Self { quarters };
        for (a, b) in router.overlaps() {
            warn!("⚠️ 季度 {} 与 {} 的日期范围重叠，按声明顺序取前者", a, b);
        }
        router
    }

    pub fn quarters(&self) -> &[QuarterDefinition] {
        &self.quarters
    }

    /// 日期所属季度；格式错误或不在任何季度内返回 `None`
    pub fn quarter_for_date(&self, date: &str) -> Option<&QuarterDefinition> {
        let target = parse_strict_date(date)?;
        self.quarters.iter().find(|q| q.contains(target))
    }

    /// 日期可用时返回 `None`，否则返回列出全部季度窗口的提示
    pub fn validate_availability(&self, date: &str) -> Option<String> {
        if self.quarter_for_date(date).is_some() {
            return None;
        }
        let windows: Vec<String> = self.quarters.iter().map(|q| q.window_label()).collect();
        let message = format!("Date must be in {}", windows.join(" or "));
        if date.trim().is_empty() {
            Some(format!("Please enter a date. {}", message))
        } else {
            Some(message)
        }
    }

    pub fn quarter_by_id(&self, id: &str) -> Option<&QuarterDefinition> {
        self.quarters.iter().find(|q| q.id == id)
    }

    pub fn available_quarter_ids(&self) -> Vec<String> {
        self.quarters.iter().map(|q| q.id.clone()).collect()
    }

    /// 今天所在季度
    pub fn current_quarter(&self, today: NaiveDate) -> Option<&QuarterDefinition> {
        self.quarters.iter().find(|q| q.contains(today))
    }

    /// 所有日期范围重叠的季度对 (前者 ID, 后者 ID)
    pub fn overlaps(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (i, a) in self.quarters.iter().enumerate() {
            for b in &self.quarters[i + 1..] {
                if a.overlaps(b) {
                    pairs.push((a.id.clone(), b.id.clone()));
                }
            }
        }
        pairs
    }
}

impl Default for QuarterRouter {
    fn default() -> Self {
        Self::new(crate::models::default_quarters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_quarters, DestinationIdentity};

    fn router() -> QuarterRouter {
        QuarterRouter::default()
    }

    #[test]
    fn test_every_day_of_2025_routes_to_exactly_one_quarter() {
        let router = router();
        let mut day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        while day <= end {
            let date = day.format("%Y-%m-%d").to_string();
            let matching = router
                .quarters()
                .iter()
                .filter(|q| q.contains(day))
                .count();
            assert_eq!(matching, 1, "{}", date);

            let q = router.quarter_for_date(&date).unwrap();
            assert!(q.start_date <= day && day <= q.end_date);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_boundaries() {
        let router = router();
        assert_eq!(router.quarter_for_date("2025-06-30").unwrap().id, "Q2-2025");
        assert_eq!(router.quarter_for_date("2025-07-01").unwrap().id, "Q3-2025");
        assert_eq!(router.quarter_for_date("2025-12-31").unwrap().id, "Q4-2025");
        assert!(router.quarter_for_date("2026-01-01").is_none());
        assert!(router.quarter_for_date("2024-12-31").is_none());
    }

    #[test]
    fn test_malformed_dates_return_none() {
        let router = router();
        for bad in [
            "",
            "2025-7-15",
            "07/15/2025",
            "2025-02-29",
            "2025-04-31",
            "2025-13-01",
            "2025-07-15T00:00",
            "abcd-ef-gh",
            " 2025-07-15",
        ] {
            assert!(router.quarter_for_date(bad).is_none(), "{:?}", bad);
        }
        assert!(parse_strict_date("2024-02-29").is_some());
    }

    #[test]
    fn test_validate_availability_messages() {
        let router = router();
        assert!(router.validate_availability("2025-08-01").is_none());

        let msg = router.validate_availability("2026-02-01").unwrap();
        assert!(msg.starts_with("Date must be in Q1 2025 (01/01-03/31) or Q2 2025 (04/01-06/30)"));
        assert!(msg.contains("Q4 2025 (10/01-12/31)"));

        let empty = router.validate_availability("").unwrap();
        assert!(empty.starts_with("Please enter a date."));
    }

    #[test]
    fn test_lookup_helpers() {
        let router = router();
        assert_eq!(
            router.available_quarter_ids(),
            vec!["Q1-2025", "Q2-2025", "Q3-2025", "Q4-2025"]
        );
        assert_eq!(router.quarter_by_id("Q4-2025").unwrap().label, "Q4 2025");
        assert!(router.quarter_by_id("Q1-2030").is_none());

        let today = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        assert_eq!(router.current_quarter(today).unwrap().id, "Q3-2025");
    }

    #[test]
    fn test_overlap_first_declared_wins() {
        let mut quarters = default_quarters();
        let mut extra = quarters[2].clone();
        extra.id = "Q3-2025-alt".to_string();
        extra.destination = DestinationIdentity::smartsheet("alt");
        quarters.push(extra);

        let router = QuarterRouter::new(quarters);
        assert_eq!(
            router.overlaps(),
            vec![("Q3-2025".to_string(), "Q3-2025-alt".to_string())]
        );
        assert_eq!(router.quarter_for_date("2025-08-01").unwrap().id, "Q3-2025");
    }
}
