use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::error::{Result, SeqError};

/// Whether a schedule advances per parameter update or per completed epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Iteration,
    Epoch,
}

impl ScheduleType {
    fn position(&self, iteration: usize, epoch: usize) -> usize {
        match self {
            ScheduleType::Iteration => iteration,
            ScheduleType::Epoch => epoch,
        }
    }
}

/// Learning rate of an updater: either a constant or a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningRate {
    Fixed(f64),
    Cycle(CycleSchedule),
    Map(MapSchedule),
}

impl LearningRate {
    pub fn value_at(&self, iteration: usize, epoch: usize) -> f64 {
        match self {
            LearningRate::Fixed(lr) => *lr,
            LearningRate::Cycle(s) => s.value_at(iteration, epoch),
            LearningRate::Map(s) => s.value_at(iteration, epoch),
        }
    }
}

impl From<f64> for LearningRate {
    fn from(lr: f64) -> Self {
        LearningRate::Fixed(lr)
    }
}

/// One-cycle policy: a linear ramp from `initial_lr` to `max_lr`, a linear
/// ramp back down, then exponential annealing below `initial_lr` for the last
/// `annealing_length` positions of each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CycleScheduleFields")]
pub struct CycleSchedule {
    pub schedule_type: ScheduleType,
    pub initial_lr: f64,
    pub max_lr: f64,
    pub cycle_length: usize,
    pub annealing_length: usize,
    pub annealing_decay: f64,
}

impl CycleSchedule {
    pub fn new(
        schedule_type: ScheduleType,
        initial_lr: f64,
        max_lr: f64,
        cycle_length: usize,
        annealing_length: usize,
        annealing_decay: f64,
    ) -> Result<CycleSchedule> {
        if cycle_length < annealing_length + 2 {
            return Err(SeqError::Config(format!(
                "cycle length {cycle_length} leaves no room for ramps after {annealing_length} annealing steps"
            )));
        }
        Ok(CycleSchedule { schedule_type, initial_lr, max_lr, cycle_length, annealing_length, annealing_decay })
    }

    fn step_size(&self) -> usize {
        (self.cycle_length - self.annealing_length) / 2
    }

    pub fn value_at(&self, iteration: usize, epoch: usize) -> f64 {
        let step = self.step_size();
        let increment = (self.max_lr - self.initial_lr) / step as f64;
        let pos = self.schedule_type.position(iteration, epoch) % self.cycle_length;

        if pos < step {
            self.initial_lr + increment * pos as f64
        } else if pos < 2 * step {
            self.max_lr - increment * (pos - step) as f64
        } else {
            let exponent = self.annealing_length as i64 - (self.cycle_length - pos) as i64;
            self.initial_lr * self.annealing_decay.powi(exponent as i32)
        }
    }
}

/// Piecewise-constant schedule: the value of the largest key `<= t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MapScheduleFields")]
pub struct MapSchedule {
    pub schedule_type: ScheduleType,
    pub values: BTreeMap<usize, f64>,
}

impl MapSchedule {
    pub fn new(schedule_type: ScheduleType, values: BTreeMap<usize, f64>) -> Result<MapSchedule> {
        if !values.contains_key(&0) {
            return Err(SeqError::Config("map schedule needs a value for position 0".into()));
        }
        Ok(MapSchedule { schedule_type, values })
    }

    pub fn value_at(&self, iteration: usize, epoch: usize) -> f64 {
        let pos = self.schedule_type.position(iteration, epoch);
        self.values
            .range(..=pos)
            .next_back()
            .map(|(_, &lr)| lr)
            .unwrap_or(0.0)
    }
}

// Deserialized schedules go through the constructors so a loaded config is
// checked the same way as a built one.

#[derive(Deserialize)]
struct CycleScheduleFields {
    schedule_type: ScheduleType,
    initial_lr: f64,
    max_lr: f64,
    cycle_length: usize,
    annealing_length: usize,
    annealing_decay: f64,
}

impl TryFrom<CycleScheduleFields> for CycleSchedule {
    type Error = SeqError;

    fn try_from(f: CycleScheduleFields) -> Result<CycleSchedule> {
        CycleSchedule::new(f.schedule_type, f.initial_lr, f.max_lr, f.cycle_length, f.annealing_length, f.annealing_decay)
    }
}

#[derive(Deserialize)]
struct MapScheduleFields {
    schedule_type: ScheduleType,
    values: BTreeMap<usize, f64>,
}

impl TryFrom<MapScheduleFields> for MapSchedule {
    type Error = SeqError;

    fn try_from(f: MapScheduleFields) -> Result<MapSchedule> {
        MapSchedule::new(f.schedule_type, f.values)
    }
}
