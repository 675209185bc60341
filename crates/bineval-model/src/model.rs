//! Binary classifier architectures.
//!
//! Both networks end in a single logit; `predict_proba` applies the sigmoid
//! and flattens the output to one probability per image.

use bineval_core::ModelArchitecture;
use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{activation::sigmoid, backend::Backend, Tensor},
};

/// Configuration for a [`BinaryClassifier`]
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// Network layout
    pub architecture: ModelArchitecture,

    /// Number of input channels (1 for grayscale, 3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Dropout rate in the dense head
    #[config(default = "0.3")]
    pub dropout: f64,

    /// Filters in the first small_cnn block
    #[config(default = "16")]
    pub base_filters: usize,
}

impl ClassifierConfig {
    /// Build the network on `device`
    pub fn init<B: Backend>(&self, device: &B::Device) -> BinaryClassifier<B> {
        match self.architecture {
            ModelArchitecture::SmallCnn => BinaryClassifier::SmallCnn(SmallCnn::new(self, device)),
            ModelArchitecture::AlexNet => BinaryClassifier::AlexNet(AlexNet::new(self, device)),
        }
    }
}

/// A pre-trained binary classifier of either architecture
#[derive(Module, Debug)]
pub enum BinaryClassifier<B: Backend> {
    SmallCnn(SmallCnn<B>),
    AlexNet(AlexNet<B>),
}

impl<B: Backend> BinaryClassifier<B> {
    /// Logits with shape [batch_size, 1]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        match self {
            BinaryClassifier::SmallCnn(model) => model.forward(images),
            BinaryClassifier::AlexNet(model) => model.forward(images),
        }
    }

    /// Positive-class probabilities with shape [batch_size]
    pub fn predict_proba(&self, images: Tensor<B, 4>) -> Tensor<B, 1> {
        let logits = self.forward(images);
        let [batch_size, _] = logits.dims();
        sigmoid(logits).reshape([batch_size])
    }

    pub fn architecture(&self) -> ModelArchitecture {
        match self {
            BinaryClassifier::SmallCnn(_) => ModelArchitecture::SmallCnn,
            BinaryClassifier::AlexNet(_) => ModelArchitecture::AlexNet,
        }
    }
}

/// Conv2d, BatchNorm, ReLU and an optional 2x2 max pool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    relu: Relu,
    pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        with_pool: bool,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);
        let pool = with_pool.then(|| MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init());

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);

        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// Three pooled conv blocks, global average pooling and a two-layer head.
#[derive(Module, Debug)]
pub struct SmallCnn<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    conv3: ConvBlock<B>,
    global_pool: AdaptiveAvgPool2d,
    fc1: Linear<B>,
    relu: Relu,
    dropout: Dropout,
    fc2: Linear<B>,
}

impl<B: Backend> SmallCnn<B> {
    pub fn new(config: &ClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        Self {
            conv1: ConvBlock::new(config.in_channels, base, 3, true, device),
            conv2: ConvBlock::new(base, base * 2, 3, true, device),
            conv3: ConvBlock::new(base * 2, base * 4, 3, true, device),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1: LinearConfig::new(base * 4, 64).init(device),
            relu: Relu::new(),
            dropout: DropoutConfig::new(config.dropout).init(),
            fc2: LinearConfig::new(64, 1).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);

        // [B, C, H, W] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = self.relu.forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }
}

/// AlexNet feature extractor with a reduced single-logit head.
///
/// Expects inputs of at least 63x63 so the three pooling stages leave a
/// non-empty feature map.
#[derive(Module, Debug)]
pub struct AlexNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    conv4: Conv2d<B>,
    conv5: Conv2d<B>,
    pool: MaxPool2d,
    global_pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    fc1: Linear<B>,
    fc2: Linear<B>,
    relu: Relu,
}

impl<B: Backend> AlexNet<B> {
    pub fn new(config: &ClassifierConfig, device: &B::Device) -> Self {
        let conv = |channels: [usize; 2], kernel: usize, stride: usize, padding: usize| -> Conv2d<B> {
            Conv2dConfig::new(channels, [kernel, kernel])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(padding, padding))
                .init(device)
        };

        Self {
            conv1: conv([config.in_channels, 64], 11, 4, 2),
            conv2: conv([64, 192], 5, 1, 2),
            conv3: conv([192, 384], 3, 1, 1),
            conv4: conv([384, 256], 3, 1, 1),
            conv5: conv([256, 256], 3, 1, 1),
            pool: MaxPool2dConfig::new([3, 3]).with_strides([2, 2]).init(),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            dropout: DropoutConfig::new(config.dropout).init(),
            fc1: LinearConfig::new(256, 256).init(device),
            fc2: LinearConfig::new(256, 1).init(device),
            relu: Relu::new(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(self.relu.forward(self.conv1.forward(x)));
        let x = self.pool.forward(self.relu.forward(self.conv2.forward(x)));
        let x = self.relu.forward(self.conv3.forward(x));
        let x = self.relu.forward(self.conv4.forward(x));
        let x = self.pool.forward(self.relu.forward(self.conv5.forward(x)));

        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.dropout.forward(x);
        let x = self.relu.forward(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }
}
