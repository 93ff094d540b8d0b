//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::SessionResult;

/// 在页面里安装 MutationObserver 计数器，并返回当前计数
///
/// 计数器只安装一次；页面跳转后会重新安装并从 0 开始。
const DOM_SIGNATURE_JS: &str = r#"
(() => {
    if (typeof window.__sheetMutations !== 'number') {
        window.__sheetMutations = 0;
        const target = document.documentElement || document;
        new MutationObserver((records) => { window.__sheetMutations += records.length; })
            .observe(target, { subtree: true, childList: true, attributes: true, characterData: true });
    }
    return window.__sheetMutations + ':' + document.readyState + ':' + location.href.length;
})()
"#;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识工时条目或季度
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> SessionResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> SessionResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 选择器命中的第一个元素是否可见
    pub async fn is_visible(&self, selector: &str) -> SessionResult<bool> {
        let selector_literal = serde_json::to_string(selector)?;
        let js = format!(
            r#"(() => {{
                let el = null;
                try {{ el = document.querySelector({sel}); }} catch (e) {{ return false; }}
                if (!el) return false;
                const style = window.getComputedStyle(el);
                if (style.visibility === 'hidden' || style.display === 'none') return false;
                const rect = el.getBoundingClientRect();
                return rect.width > 0 && rect.height > 0;
            }})()"#,
            sel = selector_literal
        );
        self.eval_as::<bool>(js).await
    }

    /// 清空输入框（兼容 React 受控组件）
    pub async fn clear_value(&self, selector: &str) -> SessionResult<()> {
        let selector_literal = serde_json::to_string(selector)?;
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.focus();
                const proto = el.tagName === 'TEXTAREA'
                    ? window.HTMLTextAreaElement.prototype
                    : window.HTMLInputElement.prototype;
                const setter = Object.getOwnPropertyDescriptor(proto, 'value');
                if (setter && setter.set) {{ setter.set.call(el, ''); }} else {{ el.value = ''; }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = selector_literal
        );
        self.eval(js).await?;
        Ok(())
    }

    /// DOM 签名的哈希值
    pub async fn dom_signature(&self) -> SessionResult<u64> {
        use std::hash::{Hash, Hasher};

        let raw = self.eval_as::<String>(DOM_SIGNATURE_JS).await?;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        raw.hash(&mut hasher);
        Ok(hasher.finish())
    }
}
