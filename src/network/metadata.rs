use serde::{Deserialize, Serialize};

/// Optional annotations attached to a saved Network.
/// All fields are Option<> so models saved without them deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Column names of the input features, in order.
    pub feature_names: Option<Vec<String>>,
    /// Human-readable class labels for the output layer (e.g. ["healthy", "failing"]).
    pub output_labels: Option<Vec<String>>,
}
