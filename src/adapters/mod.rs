// Adapters layer: concrete implementations of the domain ports.

pub mod clock;
pub mod delivery;
pub mod message_log;
pub mod reminder_store;
pub mod store;

pub use clock::{ConfiguredClock, FixedClock, SystemClock};
pub use delivery::{ConfiguredSink, LogDeliverySink, WebhookDeliverySink};
pub use message_log::{InMemoryMessageLog, JsonFileMessageLog};
pub use reminder_store::{InMemoryReminderStore, JsonFileReminderStore};
pub use store::{CsvFileMemberStore, FileMemberStore, InMemoryMemberStore, JsonFileMemberStore};
