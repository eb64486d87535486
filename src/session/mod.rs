pub mod controller;
pub mod events;
pub mod quota;
pub mod state;

pub use controller::{SessionController, Submission};
pub use events::SessionEvent;
pub use quota::{QuotaPolicy, QuotaSnapshot};
pub use state::SessionState;
