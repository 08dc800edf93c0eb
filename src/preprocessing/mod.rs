pub mod min_max;

pub use min_max::MinMaxScaler;
