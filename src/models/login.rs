//! 登录步骤表
//!
//! 登录流程固定为多步：邮箱 → SSO 选择 → AAD 邮箱 → 密码 → "保持登录"提示。
//! 每一步都是声明式记录，由 `SessionController::authenticate` 顺序执行。

/// 登录动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAction {
    /// 等待元素可见
    Wait,
    /// 输入凭据
    Input,
    /// 点击
    Click,
}

/// 输入步骤要填的值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Email,
    Password,
}

/// 登录步骤
#[derive(Debug, Clone)]
pub struct LoginStep {
    pub name: &'static str,
    pub action: LoginAction,
    pub locator: &'static str,
    pub value: Option<CredentialField>,
    pub expects_navigation: bool,
    /// 失败时只告警，不中止登录
    pub optional: bool,
    /// 日志中隐藏输入值
    pub sensitive: bool,
}

impl LoginStep {
    const fn wait(name: &'static str, locator: &'static str, optional: bool) -> Self {
        Self {
            name,
            action: LoginAction::Wait,
            locator,
            value: None,
            expects_navigation: false,
            optional,
            sensitive: false,
        }
    }

    const fn input(name: &'static str, locator: &'static str, value: CredentialField) -> Self {
        Self {
            name,
            action: LoginAction::Input,
            locator,
            value: Some(value),
            expects_navigation: false,
            optional: false,
            sensitive: true,
        }
    }

    const fn click(name: &'static str, locator: &'static str, optional: bool) -> Self {
        Self {
            name,
            action: LoginAction::Click,
            locator,
            value: None,
            expects_navigation: true,
            optional,
            sensitive: false,
        }
    }
}

/// 默认登录步骤
///
/// 最后的落地信号（项目字段可见）不在表里，由会话控制器单独等待。
pub fn login_steps() -> Vec<LoginStep> {
    vec![
        LoginStep::wait("Wait for Login Form", "#loginEmail", true),
        LoginStep::input("Email Input", "#loginEmail", CredentialField::Email),
        LoginStep::click("Continue", "#formControl", true),
        LoginStep::wait("Wait for SSO Choice", "a.clsJspButtonWide", true),
        LoginStep::click("Login with company account", "a.clsJspButtonWide", true),
        LoginStep::wait("Wait for AAD Email", "#i0116", false),
        LoginStep::input("AAD Email", "#i0116", CredentialField::Email),
        LoginStep::click("AAD Next", "#idSIButton9", true),
        LoginStep::wait("Wait for Password", "#passwordInput", false),
        LoginStep::input("Password Input", "#passwordInput", CredentialField::Password),
        LoginStep::click("Password Submit", "#submitButton", true),
        LoginStep::wait("Stay Signed In Prompt", "#idBtn_Back", true),
        LoginStep::click("Stay Signed In - No", "#idBtn_Back", true),
    ]
}

/// 提交按钮的候选选择器，按顺序尝试
pub fn submit_button_locators() -> Vec<&'static str> {
    vec![
        "button[data-client-id='form_submit_btn']",
        "button[type='submit']",
        "input[type='submit']",
        "button.submit",
        "button[aria-label*='Submit']",
        "button[title*='Submit']",
    ]
}

/// 邮箱脱敏，只保留域名
pub fn redact_email(email: &str) -> String {
    match email.find('@') {
        Some(at) => format!("***{}", &email[at..]),
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_email() {
        assert_eq!(redact_email("jane.doe@example.com"), "***@example.com");
        assert_eq!(redact_email("no-at-sign"), "***");
    }

    #[test]
    fn test_input_steps_are_sensitive() {
        for step in login_steps() {
            if step.action == LoginAction::Input {
                assert!(step.sensitive, "{} 应该脱敏", step.name);
                assert!(step.value.is_some());
            }
        }
    }

    #[test]
    fn test_password_step_present() {
        assert!(login_steps()
            .iter()
            .any(|s| s.value == Some(CredentialField::Password)));
    }
}
