#[cfg(feature = "onnx")]
mod preprocess;
#[cfg(test)]
pub mod stub;
mod types;
#[cfg(feature = "onnx")]
mod u2net;

#[cfg(feature = "onnx")]
pub use preprocess::Preprocessor;
pub use types::{cutout, SegmentationModel};
#[cfg(feature = "onnx")]
pub use u2net::U2Net;

use anyhow::Result;
use std::path::Path;

/// Create the default background-removal model (U²-Net)
#[cfg(feature = "onnx")]
pub fn create_default_model(model_path: &Path) -> Result<Box<dyn SegmentationModel>> {
    let model = U2Net::new(model_path)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
pub fn create_default_model(model_path: &Path) -> Result<Box<dyn SegmentationModel>> {
    anyhow::bail!(
        "cannot load {}: built without the `onnx` feature",
        model_path.display()
    )
}
