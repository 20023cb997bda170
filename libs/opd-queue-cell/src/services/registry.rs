use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::{OpdQueueError, Slot};

/// A slot behind its own lock. The slot is the unit of mutual exclusion.
pub type SharedSlot = Arc<Mutex<Slot>>;

#[derive(Debug, Clone)]
pub struct SlotHandle {
    pub slot_id: String,
    pub slot: SharedSlot,
}

/// Per-doctor ordered slot lists.
///
/// The outer lock only guards the doctor -> slots mapping and is released as
/// soon as a slot handle has been cloned out, so work on different slots never
/// contends.
#[derive(Debug, Default)]
pub struct ScheduleRegistry {
    schedules: RwLock<HashMap<String, Vec<SlotHandle>>>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the doctor's whole schedule. Last write wins.
    pub async fn set_doctor_schedule(&self, doctor_id: &str, slots: Vec<Slot>) {
        let handles: Vec<SlotHandle> = slots
            .into_iter()
            .map(|mut slot| {
                slot.sort_tokens();
                SlotHandle {
                    slot_id: slot.slot_id.clone(),
                    slot: Arc::new(Mutex::new(slot)),
                }
            })
            .collect();
        let slot_count = handles.len();

        let previous = self
            .schedules
            .write()
            .await
            .insert(doctor_id.to_string(), handles);

        if previous.is_some() {
            info!("Replaced schedule for doctor {} ({} slots)", doctor_id, slot_count);
        } else {
            info!("Registered schedule for doctor {} ({} slots)", doctor_id, slot_count);
        }
    }

    pub async fn has_doctor(&self, doctor_id: &str) -> bool {
        self.schedules.read().await.contains_key(doctor_id)
    }

    /// First slot with a matching id, distinguishing an unknown doctor from an
    /// unknown slot.
    pub async fn lookup_slot(&self, doctor_id: &str, slot_id: &str) -> Result<SharedSlot, OpdQueueError> {
        let schedules = self.schedules.read().await;
        let slots = schedules
            .get(doctor_id)
            .ok_or_else(|| OpdQueueError::DoctorNotFound(doctor_id.to_string()))?;

        slots
            .iter()
            .find(|handle| handle.slot_id == slot_id)
            .map(|handle| handle.slot.clone())
            .ok_or_else(|| OpdQueueError::SlotNotFound {
                doctor_id: doctor_id.to_string(),
                slot_id: slot_id.to_string(),
            })
    }

    pub async fn find_slot(&self, doctor_id: &str, slot_id: &str) -> Option<SharedSlot> {
        match self.lookup_slot(doctor_id, slot_id).await {
            Ok(slot) => Some(slot),
            Err(e) => {
                debug!("Slot lookup miss: {}", e);
                None
            }
        }
    }

    /// Point-in-time copy of a doctor's slots, in schedule order.
    pub async fn doctor_schedule(&self, doctor_id: &str) -> Option<Vec<Slot>> {
        let handles = self.schedules.read().await.get(doctor_id).cloned()?;

        let mut slots = Vec::with_capacity(handles.len());
        for handle in handles {
            slots.push(handle.slot.lock().await.clone());
        }
        Some(slots)
    }

    pub async fn doctor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.schedules.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every slot of every doctor, paired with the owning doctor id.
    pub async fn slot_handles(&self) -> Vec<(String, SlotHandle)> {
        let schedules = self.schedules.read().await;
        let mut handles: Vec<(String, SlotHandle)> = schedules
            .iter()
            .flat_map(|(doctor_id, slots)| {
                slots
                    .iter()
                    .map(move |handle| (doctor_id.clone(), handle.clone()))
            })
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        handles
    }
}
