//! URL glob 匹配
//!
//! `**` 匹配任意字符（含 `/`），`*` 匹配除 `/` 之外的任意字符，
//! `?` 匹配单个非 `/` 字符，其余字符按字面匹配。

use regex::Regex;

/// 编译后的 URL glob
#[derive(Debug, Clone)]
pub struct UrlGlob {
    pattern: String,
    regex: Regex,
}

impl UrlGlob {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&glob_to_regex(pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

/// 编译一组 glob；非法模式记录告警后跳过
pub fn compile_all(patterns: &[String]) -> Vec<UrlGlob> {
    patterns
        .iter()
        .filter_map(|p| match UrlGlob::new(p) {
            Ok(g) => Some(g),
            Err(e) => {
                tracing::warn!("忽略无效的 URL 模式 {}: {}", p, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_star_spans_segments() {
        let g = UrlGlob::new("**/api/submit/abc*").unwrap();
        assert!(g.is_match("https://forms.smartsheet.com/api/submit/abc"));
        assert!(g.is_match("https://forms.smartsheet.com/api/submit/abc?x=1"));
        assert!(!g.is_match("https://forms.smartsheet.com/api/submit/xyz"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let g = UrlGlob::new("https://app.smartsheet.com/b/form/*/thanks").unwrap();
        assert!(g.is_match("https://app.smartsheet.com/b/form/abc/thanks"));
        assert!(!g.is_match("https://app.smartsheet.com/b/form/abc/def/thanks"));
    }

    #[test]
    fn test_literal_dots_escaped() {
        let g = UrlGlob::new("https://a.b/c").unwrap();
        assert!(!g.is_match("https://axb/c"));
    }

    #[test]
    fn test_question_mark() {
        let g = UrlGlob::new("**/step?").unwrap();
        assert!(g.is_match("https://x/step1"));
        assert!(!g.is_match("https://x/step12"));
    }
}
