#![allow(dead_code)]

use opd_queue_cell::*;

pub const DOCTOR: &str = "D";
pub const SLOT: &str = "S1";

/// Engine with doctor `D` owning a single slot `S1` of the given capacity.
pub async fn engine_with_slot(max_capacity: u32) -> AllocationEngine {
    let engine = AllocationEngine::new();
    engine
        .set_doctor_schedule(DOCTOR, vec![Slot::new(SLOT, "09:00", "10:00", max_capacity)])
        .await;
    engine
}

pub async fn admit_all(engine: &AllocationEngine, patients: &[(&str, Priority)]) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (name, priority) in patients {
        tokens.push(
            engine
                .allocate(DOCTOR, SLOT, name, *priority)
                .await
                .expect("admission should succeed"),
        );
    }
    tokens
}

pub async fn queue(engine: &AllocationEngine) -> Vec<(String, Priority)> {
    let slots = engine.doctor_schedule(DOCTOR).await.expect("doctor should exist");
    slots[0]
        .tokens
        .iter()
        .map(|t| (t.patient_name.clone(), t.priority))
        .collect()
}

pub fn assert_sorted(slot: &Slot) {
    assert!(
        slot.tokens.windows(2).all(|pair| pair[0].priority <= pair[1].priority),
        "tokens should be sorted by priority: {:?}",
        slot.tokens
    );
}

pub fn entry(name: &str, priority: Priority) -> (String, Priority) {
    (name.to_string(), priority)
}
