pub mod chrome_driver;
pub mod driver;
pub mod js_executor;

pub use chrome_driver::{BrowserOwnership, ChromeDriver};
pub use driver::{AutomationDriver, DriverLauncher, ObservedResponse};
pub use js_executor::JsExecutor;
