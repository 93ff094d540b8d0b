pub mod progress;
pub mod quarter_router;
pub mod session;
pub mod warn_writer;

pub use progress::{NoopProgress, Phase, ProgressCallback, TracingProgress};
pub use quarter_router::QuarterRouter;
pub use session::{SessionController, SessionState};
pub use warn_writer::WarnWriter;
