//! Batching of test samples into backend tensors.

use bineval_core::{ChannelStats, ImageDimensions};
use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use crate::dataset::EvalItem;

/// A batch of test images
#[derive(Clone, Debug)]
pub struct EvalBatch<B: Backend> {
    /// Images with shape [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Stacks items into an [`EvalBatch`], optionally normalizing per channel.
#[derive(Clone, Debug)]
pub struct EvalBatcher<B: Backend> {
    device: B::Device,
    dims: ImageDimensions,
    normalization: Option<ChannelStats>,
}

impl<B: Backend> EvalBatcher<B> {
    pub fn new(device: B::Device, dims: ImageDimensions) -> Self {
        Self {
            device,
            dims,
            normalization: None,
        }
    }

    /// Apply `(x - mean) / std` per channel; stats must match the channel count
    pub fn with_normalization(mut self, stats: Option<ChannelStats>) -> Self {
        self.normalization = stats;
        self
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

impl<B: Backend> Batcher<EvalItem, EvalBatch<B>> for EvalBatcher<B> {
    fn batch(&self, items: Vec<EvalItem>) -> EvalBatch<B> {
        let batch_size = items.len();
        let channels = self.dims.channels as usize;
        let height = self.dims.height as usize;
        let width = self.dims.width as usize;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.iter().copied()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            &self.device,
        );

        let images = match &self.normalization {
            Some(stats) => {
                let mean = Tensor::<B, 4>::from_floats(
                    TensorData::new(stats.mean.clone(), [1, channels, 1, 1]),
                    &self.device,
                );
                let std = Tensor::<B, 4>::from_floats(
                    TensorData::new(stats.std.clone(), [1, channels, 1, 1]),
                    &self.device,
                );
                (images - mean) / std
            }
            None => images,
        };

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets_data, [batch_size]),
            &self.device,
        );

        EvalBatch { images, targets }
    }
}
