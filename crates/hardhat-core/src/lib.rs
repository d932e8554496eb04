pub mod category;
pub mod classifier;
pub mod component;
pub mod errors;
pub mod ids;

pub use category::Category;
pub use classifier::{ClassifyOptions, Classifier};
pub use component::Component;
pub use errors::ClassifierError;
