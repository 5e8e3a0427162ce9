//! Configuration types for mistral.rs model loading.

use granite_rag::{Device, GenerationConfig, PerformanceHint, Precision};

use crate::error::{MistralRsError, Result};

/// Configuration for loading a mistral.rs text model.
#[derive(Debug, Clone, PartialEq)]
pub struct MistralRsConfig {
    /// HuggingFace model ID or local model directory
    pub model_id: String,

    /// Data type for model weights
    pub dtype: DataType,

    /// Pin every layer to the CPU even when an accelerator is compiled in
    pub force_cpu: bool,

    /// Enable PagedAttention
    pub paged_attention: bool,

    /// Forward mistral.rs loader logs
    pub logging: bool,
}

impl Default for MistralRsConfig {
    fn default() -> Self {
        Self {
            model_id: granite_rag::config::DEFAULT_MODEL_ID.to_string(),
            dtype: DataType::default(),
            force_cpu: true,
            paged_attention: false,
            logging: false,
        }
    }
}

impl MistralRsConfig {
    /// Create a new config builder
    pub fn builder() -> MistralRsConfigBuilder {
        MistralRsConfigBuilder::default()
    }

    /// Derive a loader config from the generation settings.
    ///
    /// `precision` selects the weight dtype and `backend_logs` turns on
    /// mistral.rs's own loader logging. `Latency` keeps the default single-sequence scheduler; `Throughput`
    /// turns on PagedAttention so several requests can share the KV cache.
    ///
    /// # Errors
    ///
    /// Returns [`MistralRsError::DeviceNotAvailable`] when the requested
    /// accelerator was not compiled in, or when a CUDA ordinal other than 0 is
    /// requested.
    pub fn from_generation(config: &GenerationConfig) -> Result<Self> {
        let force_cpu = match config.device {
            Device::Cpu => true,
            Device::Auto => false,
            Device::Cuda(0) if cfg!(feature = "cuda") => false,
            Device::Metal if cfg!(feature = "metal") => false,
            other => {
                return Err(MistralRsError::DeviceNotAvailable { device: device_label(other) });
            }
        };

        Ok(Self::builder()
            .model_id(config.model_id.clone())
            .dtype(config.precision.into())
            .force_cpu(force_cpu)
            .paged_attention(config.performance_hint == PerformanceHint::Throughput)
            .logging(config.backend_logs)
            .build())
    }
}

fn device_label(device: Device) -> String {
    match device {
        Device::Auto => "auto".to_string(),
        Device::Cpu => "cpu".to_string(),
        Device::Cuda(ordinal) => format!("cuda:{ordinal}"),
        Device::Metal => "metal".to_string(),
    }
}

/// Builder for MistralRsConfig
#[derive(Debug, Clone, Default)]
pub struct MistralRsConfigBuilder {
    config: MistralRsConfig,
}

impl MistralRsConfigBuilder {
    /// Set the model ID
    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.config.model_id = model_id.into();
        self
    }

    /// Set the data type
    pub fn dtype(mut self, dtype: DataType) -> Self {
        self.config.dtype = dtype;
        self
    }

    /// Pin the model to the CPU
    pub fn force_cpu(mut self, force_cpu: bool) -> Self {
        self.config.force_cpu = force_cpu;
        self
    }

    /// Enable PagedAttention
    pub fn paged_attention(mut self, enabled: bool) -> Self {
        self.config.paged_attention = enabled;
        self
    }

    /// Forward mistral.rs loader logs
    pub fn logging(mut self, enabled: bool) -> Self {
        self.config.logging = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> MistralRsConfig {
        self.config
    }
}

/// Data type for model weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataType {
    /// 32-bit floating point
    F32,
    /// 16-bit floating point
    F16,
    /// Brain floating point 16
    BF16,
    /// Auto-detect based on model and hardware
    #[default]
    Auto,
}

impl From<Precision> for DataType {
    fn from(precision: Precision) -> Self {
        match precision {
            Precision::Auto => DataType::Auto,
            Precision::F32 => DataType::F32,
            Precision::F16 => DataType::F16,
            Precision::Bf16 => DataType::BF16,
        }
    }
}

impl DataType {
    pub(crate) fn to_model_dtype(self) -> mistralrs::ModelDType {
        match self {
            DataType::F32 => mistralrs::ModelDType::F32,
            DataType::F16 => mistralrs::ModelDType::F16,
            DataType::BF16 => mistralrs::ModelDType::BF16,
            DataType::Auto => mistralrs::ModelDType::Auto,
        }
    }
}
