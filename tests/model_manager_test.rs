use emotion_radar::{BuiltinModel, ModelError, ModelInfo, ModelManager};

fn scratch_manager(tag: &str) -> ModelManager {
    let dir = std::env::temp_dir()
        .join("emotion_radar-it")
        .join(format!("{}-{}", tag, std::process::id()));
    ModelManager::new(dir).expect("failed to create model cache")
}

#[test]
fn test_model_paths() -> Result<(), Box<dyn std::error::Error>> {
    let manager = scratch_manager("paths");
    let info = BuiltinModel::YtLiveJaBertEmotion.get_model_info();

    assert!(manager.get_model_path(&info.name).ends_with("ytlive-jabert-emotion-v1/model.onnx"));
    assert!(manager.get_tokenizer_path(&info).ends_with("ytlive-jabert-emotion-v1/vocab.txt"));
    assert!(manager.get_config_path(&info.name).ends_with("ytlive-jabert-emotion-v1/config.json"));
    Ok(())
}

#[test]
fn test_model_verification_without_files() -> Result<(), Box<dyn std::error::Error>> {
    let manager = scratch_manager("verify");
    let info = BuiltinModel::YtLiveJaBertEmotion.get_model_info();

    manager.remove_download(&info)?;
    assert!(!manager.is_model_downloaded(&info));
    assert!(!manager.verify_model(&info)?);
    assert!(matches!(
        manager.require_downloaded(&info),
        Err(ModelError::NotDownloaded(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_hash_mismatch_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let manager = scratch_manager("mismatch");
    let info = ModelInfo {
        name: "pinned".to_string(),
        model_url: "http://127.0.0.1:9/model.onnx".to_string(),
        tokenizer_url: "http://127.0.0.1:9/tokenizer.json".to_string(),
        config_url: "http://127.0.0.1:9/config.json".to_string(),
        homepage: String::new(),
        model_hash: Some("0".repeat(64)),
        tokenizer_hash: None,
        config_hash: None,
    };
    std::fs::create_dir_all(manager.get_model_dir(&info.name))?;
    std::fs::write(manager.get_model_path(&info.name), b"stale")?;
    std::fs::write(manager.get_tokenizer_path(&info), b"{}")?;
    std::fs::write(manager.get_config_path(&info.name), b"{}")?;

    assert!(manager.is_model_downloaded(&info));
    assert!(!manager.verify_model(&info)?);

    // The re-download cannot reach the unroutable URL, so everything is cleaned up.
    assert!(manager.ensure_model_downloaded(&info).await.is_err());
    assert!(!manager.is_model_downloaded(&info));
    Ok(())
}

#[tokio::test]
#[ignore = "downloads the pretrained model"]
async fn test_default_model_download() -> Result<(), ModelError> {
    let manager = ModelManager::new_default()?;
    let info = BuiltinModel::YtLiveJaBertEmotion.get_model_info();

    manager.ensure_model_downloaded(&info).await?;
    assert!(manager.is_model_downloaded(&info));
    assert!(manager.verify_model(&info)?);
    Ok(())
}
