pub mod entry;
pub mod field;
pub mod loaders;
pub mod login;
pub mod quarter;
pub mod result;

pub use entry::{EntryStatus, NewEntry, TimesheetEntry};
pub use field::{FieldSpec, FieldTable, FieldType, LocatorStrategy};
pub use loaders::{load_quarter_file, parse_quarters};
pub use login::{login_steps, redact_email, LoginAction, LoginStep};
pub use quarter::{default_quarters, DestinationIdentity, QuarterDefinition};
pub use result::{AutomationResult, SubmissionResult};
