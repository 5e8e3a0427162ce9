//! Tests for mapping generation settings onto mistral.rs loader options.
//!
//! Tests that download model weights are `#[ignore]`d; run them with
//! `cargo test -p granite-mistralrs -- --ignored`.

use granite_mistralrs::{
    DataType, MistralRsConfig, MistralRsEmbedder, MistralRsError, MistralRsGenerator,
};
use granite_rag::{
    Device, GenerationConfig, GenerationRunner, PerformanceHint, Precision, PromptComposer,
    RagError,
};
use proptest::prelude::*;

fn generation(device: Device, performance_hint: PerformanceHint) -> GenerationConfig {
    GenerationConfig { device, performance_hint, ..GenerationConfig::default() }
}

#[test]
fn default_generation_config_loads_on_cpu_for_latency() {
    let config = MistralRsConfig::from_generation(&GenerationConfig::default()).unwrap();
    assert_eq!(config.model_id, "ibm-granite/granite-3.3-2b-instruct");
    assert!(config.force_cpu);
    assert!(!config.paged_attention);
    assert_eq!(config.dtype, DataType::Auto);
    assert!(!config.logging);
}

#[test]
fn precision_and_backend_logs_reach_the_loader() {
    let config = GenerationConfig {
        precision: Precision::Bf16,
        backend_logs: true,
        ..GenerationConfig::default()
    };
    let mapped = MistralRsConfig::from_generation(&config).unwrap();
    assert_eq!(mapped.dtype, DataType::BF16);
    assert!(mapped.logging);

    let config = GenerationConfig { precision: Precision::F16, ..GenerationConfig::default() };
    assert_eq!(MistralRsConfig::from_generation(&config).unwrap().dtype, DataType::F16);
}

#[test]
fn throughput_hint_enables_paged_attention() {
    let config =
        MistralRsConfig::from_generation(&generation(Device::Cpu, PerformanceHint::Throughput))
            .unwrap();
    assert!(config.paged_attention);
}

#[test]
fn auto_device_lets_the_backend_choose() {
    let config =
        MistralRsConfig::from_generation(&generation(Device::Auto, PerformanceHint::Latency))
            .unwrap();
    assert!(!config.force_cpu);
}

#[test]
fn secondary_cuda_ordinal_is_rejected() {
    let err = MistralRsConfig::from_generation(&generation(Device::Cuda(1), PerformanceHint::Latency))
        .unwrap_err();
    assert!(matches!(err, MistralRsError::DeviceNotAvailable { ref device } if device == "cuda:1"));
    assert!(matches!(RagError::from(err), RagError::ConfigError(_)));
}

#[cfg(not(feature = "metal"))]
#[test]
fn metal_requires_the_metal_feature() {
    let err = MistralRsConfig::from_generation(&generation(Device::Metal, PerformanceHint::Latency))
        .unwrap_err();
    assert!(matches!(err, MistralRsError::DeviceNotAvailable { .. }));
}

fn arb_hint() -> impl Strategy<Value = PerformanceHint> {
    prop_oneof![Just(PerformanceHint::Latency), Just(PerformanceHint::Throughput)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// *For any* model ID and hint, a CPU config maps to a CPU-pinned loader
    /// that keeps the model ID and enables PagedAttention only for throughput.
    #[test]
    fn prop_cpu_mapping_preserves_settings(model_id in "[a-z]{3,10}/[a-z0-9.-]{3,20}", hint in arb_hint()) {
        let config = GenerationConfig {
            model_id: model_id.clone(),
            ..generation(Device::Cpu, hint)
        };
        let mapped = MistralRsConfig::from_generation(&config).unwrap();
        prop_assert_eq!(mapped.model_id, model_id);
        prop_assert!(mapped.force_cpu);
        prop_assert_eq!(mapped.paged_attention, hint == PerformanceHint::Throughput);
    }
}

#[tokio::test]
async fn invalid_generation_config_fails_before_loading() {
    let config = GenerationConfig { max_new_tokens: 0, ..GenerationConfig::default() };
    let err = MistralRsGenerator::from_generation_config(&config).await.unwrap_err();
    assert!(matches!(err, MistralRsError::InvalidConfig(_)));
}

#[tokio::test]
async fn zero_embedding_dimensions_fail_before_loading() {
    let err = MistralRsEmbedder::load("ibm-granite/granite-embedding-30m-english", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, MistralRsError::InvalidConfig(_)));
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn granite_answers_on_cpu() {
    let generator = MistralRsGenerator::from_generation_config(&GenerationConfig::default())
        .await
        .unwrap();
    let options = granite_rag::GenerationOptions { max_new_tokens: 32, ..Default::default() };
    let runner = GenerationRunner::new(std::sync::Arc::new(generator), options).unwrap();

    let result = runner.run(&PromptComposer::direct("Can you tell me about MTV.")).await.unwrap();
    assert!(!result.text.is_empty());
    assert!(result.stats.generated_tokens <= 32);
    assert!(result.stats.input_tokens > 0);
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn granite_embeddings_have_advertised_width() {
    use granite_rag::EmbeddingProvider;

    let embedder = MistralRsEmbedder::load("ibm-granite/granite-embedding-30m-english", 384)
        .await
        .unwrap();
    let vector = embedder.embed("MTV is a media company.").await.unwrap();
    assert_eq!(vector.len(), 384);
}

#[tokio::test]
#[ignore = "downloads tokenizer_config.json"]
async fn granite_template_carries_the_system_preamble() {
    let template = granite_mistralrs::ChatTemplate::load("ibm-granite/granite-3.3-2b-instruct")
        .await
        .unwrap();
    let rendered =
        template.render(&PromptComposer::direct("Can you tell me about MTV."), true, false).unwrap();

    assert!(rendered.contains("You are Granite, developed by IBM."));
    assert!(rendered.contains("Can you tell me about MTV."));
}
