use log::info;

use crate::{
    db::{
        helpers::{decode_or_default, encode},
        keys, PageStorage,
    },
    error::{CareError, CareResult},
    models::Goals,
};

use super::PatientConsole;

const INVALID_GOALS: &str = "Please enter valid, non-negative numbers for all goals.";

/// Parses the three goal fields as typed. Steps are truncated to whole steps;
/// every value must be a finite, non-negative number. Values above the targets
/// are capped.
pub fn parse_goal_input(steps: &str, water: &str, sleep: &str) -> CareResult<Goals> {
    let steps = non_negative(steps)?;
    let water = non_negative(water)?;
    let sleep = non_negative(sleep)?;

    Ok(Goals {
        steps: steps.trunc().min(f64::from(u32::MAX)) as u32,
        water,
        sleep,
    }
    .capped())
}

fn non_negative(raw: &str) -> CareResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(CareError::validation(INVALID_GOALS)),
    }
}

impl<S: PageStorage> PatientConsole<S> {
    pub async fn load_goals(&self) -> CareResult<Goals> {
        let raw = self.storage.get_item(keys::PATIENT_GOALS).await?;
        Ok(decode_or_default(keys::PATIENT_GOALS, raw.as_deref()))
    }

    pub async fn update_goals(&self, steps: &str, water: &str, sleep: &str) -> CareResult<Goals> {
        let goals = parse_goal_input(steps, water, sleep)?;
        self.storage
            .set_item(keys::PATIENT_GOALS, encode(keys::PATIENT_GOALS, &goals)?)
            .await?;
        info!(
            "Goals updated: {} steps, {} L water, {} h sleep",
            goals.steps, goals.water, goals.sleep
        );
        Ok(goals)
    }
}
