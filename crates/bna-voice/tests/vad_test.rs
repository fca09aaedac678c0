use bna_voice::{VadConfig, VadModel};
use std::io::Write;

fn write_model(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    file.write_all(bytes).expect("failed to write model bytes");
    file
}

#[test]
fn load_reads_model_from_disk() {
    let file = write_model(b"onnx-model-bytes");

    let model = VadModel::load(VadConfig {
        model_path: file.path().to_path_buf(),
        sample_rate: 16_000,
    })
    .expect("failed to load VAD model");

    assert_eq!(model.model_size(), 16);
    assert_eq!(model.sample_rate(), 16_000);
    assert_eq!(model.model_path(), file.path());
}

#[test]
fn load_fails_on_missing_file() {
    let err = VadModel::load(VadConfig {
        model_path: "/nonexistent/silero_vad.onnx".into(),
        sample_rate: 16_000,
    })
    .unwrap_err();

    assert!(err.to_string().contains("failed to read VAD model"));
}

#[test]
fn load_fails_on_empty_file() {
    let file = write_model(b"");

    let err = VadModel::load(VadConfig {
        model_path: file.path().to_path_buf(),
        sample_rate: 16_000,
    })
    .unwrap_err();

    assert!(err.to_string().contains("is empty"));
}

#[test]
fn clones_share_the_loaded_model() {
    let file = write_model(b"onnx-model-bytes");

    let model = VadModel::load(VadConfig {
        model_path: file.path().to_path_buf(),
        sample_rate: 16_000,
    })
    .expect("failed to load VAD model");

    let clone = model.clone();
    assert!(model.same_model(&clone));
}

#[test]
fn default_config_targets_silero() {
    let config = VadConfig::default();
    assert_eq!(config.sample_rate, 16_000);
    assert!(config.model_path.ends_with("silero_vad.onnx"));
}
