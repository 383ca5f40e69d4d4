//! Shared test doubles and fixtures for Switchyard.

mod clock;
mod fixtures;
mod logging;
mod queue;
mod trace;

pub use clock::FixedClock;
pub use fixtures::{ChangeEmailCommand, GetUserQuery, RegisterUserCommand, UserRegisteredEvent};
pub use logging::init_test_tracing;
pub use queue::{FailingMessageQueue, RecordingMessageQueue};
pub use trace::TraceLog;
