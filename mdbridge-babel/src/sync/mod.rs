//! Live synchronization between a document engine and Markdown text
//!
//!     Edits to the tree arrive as change events and arm a debounce deadline;
//!     the export runs once the document has been quiet for the configured
//!     window, or immediately on [`SyncController::flush`]. Text going the other
//!     way is parsed and swapped into the engine synchronously by
//!     [`SyncController::set_markdown`], and the change event that swap raises is
//!     recognized and dropped so an import never turns into an export.
//!
//!     Everything runs on the host's loop. There are no threads or timers in
//!     here: the host calls [`SyncController::poll`] from its own timer (or uses
//!     [`SyncController::time_until_export`] to schedule one), and time itself
//!     comes from a [`Clock`] so tests can drive it by hand.

pub mod clock;
pub mod controller;
pub mod engine;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{SharedSync, SyncController, SyncOptions};
pub use engine::{ChangeListener, DocumentEngine, MemoryEngine, Subscription};
