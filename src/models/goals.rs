//! Daily wellness goals tracked on the patient console.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    pub steps: u32,
    /// Litres.
    pub water: f64,
    /// Hours.
    pub sleep: f64,
}

pub const GOAL_TARGETS: Goals = Goals {
    steps: 10_000,
    water: 8.0,
    sleep: 8.0,
};

impl Default for Goals {
    fn default() -> Self {
        Self {
            steps: 7_500,
            water: 6.0,
            sleep: 7.0,
        }
    }
}

impl Goals {
    pub fn capped(self) -> Self {
        Self {
            steps: self.steps.min(GOAL_TARGETS.steps),
            water: self.water.min(GOAL_TARGETS.water),
            sleep: self.sleep.min(GOAL_TARGETS.sleep),
        }
    }

    pub fn progress(&self) -> GoalProgress {
        let steps = percent(f64::from(self.steps), f64::from(GOAL_TARGETS.steps));
        let water = percent(self.water, GOAL_TARGETS.water);
        let sleep = percent(self.sleep, GOAL_TARGETS.sleep);

        GoalProgress {
            overall: ((steps + water + sleep) / 3.0).round() as u32,
            steps: round_tenth(steps),
            water: round_tenth(water),
            sleep: round_tenth(sleep),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// Whole percent.
    pub overall: u32,
    pub steps: f64,
    pub water: f64,
    pub sleep: f64,
}

fn percent(current: f64, target: f64) -> f64 {
    (current / target * 100.0).min(100.0)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
