//! Event ingestion port trait.

use crate::domain::error::BillpulseError;
use crate::domain::event::EventRecord;

pub trait EventPort {
    fn load_events(&self) -> Result<Vec<EventRecord>, BillpulseError>;
}
