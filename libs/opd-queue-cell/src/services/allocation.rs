use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::services::registry::ScheduleRegistry;
use crate::{OpdQueueError, Priority, PriorityUpgrade, Slot, Token};

/// Queues at or below this depth are never touched by the fairness pass.
pub const STARVATION_MIN_QUEUE_DEPTH: usize = 2;

/// Priority a starved tail token is promoted to.
pub const STARVATION_UPGRADE_PRIORITY: Priority = Priority::PaidPriority;

/// Admission, cancellation and fairness correction over a [`ScheduleRegistry`].
///
/// Every operation locks exactly one slot for its whole read-modify-write, so
/// the token sequence is sorted whenever a caller observes it.
#[derive(Debug, Default)]
pub struct AllocationEngine {
    registry: ScheduleRegistry,
}

impl AllocationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ScheduleRegistry {
        &self.registry
    }

    pub async fn set_doctor_schedule(&self, doctor_id: &str, slots: Vec<Slot>) {
        self.registry.set_doctor_schedule(doctor_id, slots).await;
    }

    pub async fn doctor_schedule(&self, doctor_id: &str) -> Option<Vec<Slot>> {
        self.registry.doctor_schedule(doctor_id).await
    }

    /// Admits a patient into a slot and returns the issued token.
    ///
    /// Non-emergency admissions into a full slot fail with
    /// [`OpdQueueError::CapacityExceeded`]. Emergencies are always admitted,
    /// even past `max_capacity`.
    #[instrument(skip(self))]
    pub async fn allocate(
        &self,
        doctor_id: &str,
        slot_id: &str,
        patient_name: &str,
        priority: Priority,
    ) -> Result<Token, OpdQueueError> {
        let shared = self.registry.lookup_slot(doctor_id, slot_id).await?;
        let mut slot = shared.lock().await;

        if slot.is_full() {
            if !priority.bypasses_capacity() {
                debug!(
                    "Rejecting {} admission for {}: slot {} holds {}/{}",
                    priority, patient_name, slot_id, slot.tokens.len(), slot.max_capacity
                );
                return Err(OpdQueueError::CapacityExceeded {
                    slot_id: slot.slot_id.clone(),
                    max_capacity: slot.max_capacity,
                });
            }
            warn!(
                doctor_id,
                slot_id,
                queue_len = slot.tokens.len(),
                max_capacity = slot.max_capacity,
                "Emergency admission past slot capacity"
            );
        }

        let token = Token::new(slot.next_token_id(), patient_name, priority);
        slot.tokens.push(token.clone());
        slot.sort_tokens();

        info!(
            "Issued {} to {} ({}) in slot {} for doctor {}",
            token.token_id, token.patient_name, token.priority, slot_id, doctor_id
        );
        Ok(token)
    }

    /// Removes a token from a slot. Unknown doctors, slots and tokens are a
    /// silent no-op. Returns whether a token was removed.
    pub async fn cancel(&self, doctor_id: &str, slot_id: &str, token_id: &str) -> bool {
        let Some(shared) = self.registry.find_slot(doctor_id, slot_id).await else {
            return false;
        };
        let mut slot = shared.lock().await;

        match slot.position_of(token_id) {
            Some(index) => {
                // Removal keeps survivors in order, no re-sort needed.
                slot.tokens.remove(index);
                info!("Cancelled {} in slot {} for doctor {}", token_id, slot_id, doctor_id);
                true
            }
            None => {
                debug!("Cancel ignored: no token {} in slot {} for doctor {}", token_id, slot_id, doctor_id);
                false
            }
        }
    }

    /// Single-shot fairness correction: if the tail token of a queue deeper
    /// than [`STARVATION_MIN_QUEUE_DEPTH`] ranks below paid priority, it is
    /// promoted to [`STARVATION_UPGRADE_PRIORITY`] and the queue is re-sorted.
    pub async fn relieve_pressure(&self, doctor_id: &str, slot_id: &str) -> Option<PriorityUpgrade> {
        let shared = self.registry.find_slot(doctor_id, slot_id).await?;
        let mut slot = shared.lock().await;
        relieve_slot(doctor_id, &mut slot)
    }

    /// Runs [`AllocationEngine::relieve_pressure`] once on every slot of every
    /// doctor.
    pub async fn relieve_all(&self) -> Vec<PriorityUpgrade> {
        let mut upgrades = Vec::new();
        for (doctor_id, handle) in self.registry.slot_handles().await {
            let mut slot = handle.slot.lock().await;
            if let Some(upgrade) = relieve_slot(&doctor_id, &mut slot) {
                upgrades.push(upgrade);
            }
        }
        upgrades
    }
}

fn relieve_slot(doctor_id: &str, slot: &mut Slot) -> Option<PriorityUpgrade> {
    if slot.tokens.len() <= STARVATION_MIN_QUEUE_DEPTH {
        return None;
    }

    let tail = slot.tokens.last_mut()?;
    if tail.priority <= STARVATION_UPGRADE_PRIORITY {
        return None;
    }

    let previous_priority = tail.priority;
    tail.priority = STARVATION_UPGRADE_PRIORITY;

    let upgrade = PriorityUpgrade {
        doctor_id: doctor_id.to_string(),
        slot_id: slot.slot_id.clone(),
        token_id: tail.token_id.clone(),
        patient_name: tail.patient_name.clone(),
        previous_priority,
        new_priority: STARVATION_UPGRADE_PRIORITY,
        upgraded_at: Utc::now(),
    };
    slot.sort_tokens();

    warn!(
        doctor_id = %upgrade.doctor_id,
        slot_id = %upgrade.slot_id,
        token_id = %upgrade.token_id,
        patient = %upgrade.patient_name,
        from = %upgrade.previous_priority,
        to = %upgrade.new_priority,
        "Starvation detected: upgrading {} to {}",
        upgrade.patient_name,
        upgrade.new_priority
    );
    Some(upgrade)
}
