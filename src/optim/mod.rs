pub mod adam;
pub mod optimizer;
pub mod rmsprop;
pub mod schedule;
pub mod sgd;

pub use adam::Adam;
pub use optimizer::{Optimizer, Updater};
pub use rmsprop::RmsProp;
pub use schedule::{CycleSchedule, LearningRate, MapSchedule, ScheduleType};
pub use sgd::Sgd;
