use super::preprocess::Preprocessor;
use super::types::{cutout, SegmentationModel};
use anyhow::{ensure, Context, Result};
use image::{RgbImage, RgbaImage};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// Side length of the square U²-Net input
const INPUT_SIZE: u32 = 320;

/// U²-Net salient object segmentation, the general-purpose background
/// removal network.
///
/// Stateless: every frame is segmented independently.
pub struct U2Net {
    session: Session,
    preprocessor: Preprocessor,
}

impl U2Net {
    /// Create a new U²-Net model from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading U2Net model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("U2Net model loaded successfully");

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(INPUT_SIZE, INPUT_SIZE),
        })
    }
}

impl SegmentationModel for U2Net {
    fn segment(&mut self, image: &RgbImage) -> Result<RgbaImage> {
        let _span = tracing::debug_span!("u2net_segment").entered();

        let input = self.preprocessor.preprocess(image)?;
        let shape = [1usize, 3, INPUT_SIZE as usize, INPUT_SIZE as usize];
        let tensor = Tensor::from_array((shape, input.into_raw_vec()))?;

        // The first output is the fused saliency map, shape [1, 1, H, W]
        let (matte_width, matte_height, mut prediction) = {
            let _infer_span = tracing::debug_span!("inference").entered();
            let outputs = self
                .session
                .run(ort::inputs![tensor])
                .context("Failed to run inference")?;
            let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
            ensure!(shape.len() == 4, "unexpected output rank {}", shape.len());

            let height = shape[2] as u32;
            let width = shape[3] as u32;
            let plane = (width * height) as usize;
            ensure!(data.len() >= plane, "output holds {} values", data.len());
            (width, height, data[..plane].to_vec())
        };

        Preprocessor::normalize_prediction(&mut prediction);

        let (frame_width, frame_height) = image.dimensions();
        let mask = Preprocessor::postprocess_matte(
            &prediction,
            matte_width,
            matte_height,
            frame_width,
            frame_height,
        )?;

        cutout(image, &mask)
    }

    fn name(&self) -> &str {
        "u2net"
    }
}
