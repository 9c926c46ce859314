pub mod clock;
pub mod errors;
pub mod events;
pub mod ids;
pub mod session;

pub use clock::{Clock, ElapsedClock, ManualClock, SystemClock, WallClock};
pub use errors::{IdError, TokenError};
pub use events::{EventLog, Log, StartSessionLog};
pub use ids::{LogId, SessionId};
pub use session::Session;
