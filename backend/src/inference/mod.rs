pub mod labels;
pub mod model;

pub use model::{ClassifierModel, InferenceError};
