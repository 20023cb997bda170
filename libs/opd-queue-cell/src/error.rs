use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpdQueueError {
    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Slot {slot_id} not found for doctor {doctor_id}")]
    SlotNotFound { doctor_id: String, slot_id: String },

    #[error("Slot {slot_id} is at maximum capacity ({max_capacity})")]
    CapacityExceeded { slot_id: String, max_capacity: u32 },
}

impl OpdQueueError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OpdQueueError::DoctorNotFound(_) | OpdQueueError::SlotNotFound { .. })
    }
}
