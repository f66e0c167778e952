//! Shared record types for synced form content.

pub mod question;
pub mod record;
pub mod section;

pub use question::{NewQuestion, Question};
pub use record::{Fields, RecordId, RecordState};
pub use section::{NewSection, Section};
