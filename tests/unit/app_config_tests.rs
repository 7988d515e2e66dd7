/*!
 * Tests for configuration file handling
 */

use anyhow::Result;
use postrelay::app_config::{ChannelConfig, Config, LogLevel};

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_config_saveThenLoad_shouldKeepChannels() -> Result<()> {
    let dir = create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.channels.push(ChannelConfig {
        link: "https://x.com/lookonchain".to_string(),
        category: Some("Market Events".to_string()),
    });
    config.log_level = LogLevel::Debug;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.channels, config.channels);
    assert_eq!(loaded.log_level, LogLevel::Debug);
    assert_eq!(loaded.surfaces, config.surfaces);
    Ok(())
}

#[test]
fn test_config_partialFile_shouldFillDefaults() -> Result<()> {
    let dir = create_temp_dir()?;
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "surfaces": { "caption": { "hard_limit": 1024, "safety_margin": 100 } },
            "channels": [ { "link": "@whale_alert" } ],
            "log_level": "warn"
        }"#,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.surfaces.caption.effective_limit(), 924);
    assert_eq!(config.surfaces.message.effective_limit(), 3896);
    assert_eq!(config.channels[0].category, None);
    assert_eq!(config.log_level, LogLevel::Warn);
    assert_eq!(config.translation.target_language, "ms");
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_config_malformedFile_shouldFail() -> Result<()> {
    let dir = create_temp_dir()?;
    let path = create_test_file(dir.path(), "conf.json", "{ not json")?;
    assert!(Config::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_config_missingFile_shouldFail() -> Result<()> {
    let dir = create_temp_dir()?;
    assert!(Config::from_file(&dir.path().join("absent.json")).is_err());
    Ok(())
}
