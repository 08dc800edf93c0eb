pub mod forecast;
pub mod maintenance;

pub use forecast::{ForecastConfig, ForecastReport, Prediction};
pub use maintenance::{MaintenanceConfig, MaintenanceReport};
