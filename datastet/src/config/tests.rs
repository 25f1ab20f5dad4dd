#[cfg(test)]
mod tests {
    use crate::config::{
        ClassifierMode, ConfigBuilder, ConfigError, ConfigLoader, DatastetConfig, LogFormat,
        LogLevel, validation,
    };
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = DatastetConfig::default();
        assert!(config.propagation.enabled);
        assert_eq!(config.propagation.tfidf_threshold, 0.001);
        assert_eq!(config.attachment.citation_window, 5);
        assert_eq!(config.context.mode, ClassifierMode::Binary);
        assert!(!config.disambiguation.enabled);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_tfidf_threshold(0.002)
            .with_citation_window(8)
            .with_context_service("http://classifier:8060", ClassifierMode::MultiLabel)
            .with_log_level(LogLevel::Debug)
            .build()
            .unwrap();

        assert_eq!(config.propagation.tfidf_threshold, 0.002);
        assert_eq!(config.attachment.citation_window, 8);
        assert!(config.context.enabled);
        assert_eq!(config.context.url, "http://classifier:8060");
        assert_eq!(config.context.mode, ClassifierMode::MultiLabel);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_validation() {
        let valid = ConfigBuilder::new().build();
        assert!(valid.is_ok());

        let config = DatastetConfig::default();
        assert!(validation::validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let negative = ConfigBuilder::new().with_tfidf_threshold(-1.0).build();
        assert!(matches!(negative, Err(ConfigError::ValidationError(_))));

        let bad_url = ConfigBuilder::new()
            .with_disambiguation_service("localhost:8090")
            .build();
        assert!(matches!(bad_url, Err(ConfigError::ValidationError(_))));

        let missing_file = ConfigBuilder::new()
            .with_idf_file("/definitely/not/here/idf.tsv")
            .build();
        assert!(matches!(missing_file, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_disabled_service_url_is_not_checked() {
        let mut config = DatastetConfig::default();
        config.consolidation.url = String::new();
        assert!(validation::validate_config(&config).is_ok());
    }

    #[test]
    fn test_predefined_configs() {
        let test = ConfigBuilder::testing().build().unwrap();
        assert!(!test.context.enabled);
        assert!(!test.consolidation.enabled);
        assert_eq!(test.logging.level, LogLevel::Warn);

        let prod = ConfigBuilder::production().build().unwrap();
        assert!(prod.context.enabled);
        assert!(prod.datatype.enabled);
        assert!(prod.disambiguation.enabled);
        assert!(prod.consolidation.enabled);
        assert_eq!(prod.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[propagation]\ntfidf_threshold = 0.005\n\n[context]\nmode = \"multilabel\"\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = ConfigLoader::new()
            .load_file(file.path())
            .unwrap()
            .extract()
            .unwrap();

        assert_eq!(config.propagation.tfidf_threshold, 0.005);
        assert!(config.propagation.enabled);
        assert_eq!(config.context.mode, ClassifierMode::MultiLabel);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_load_missing_or_unsupported_file() {
        let mut loader = ConfigLoader::new();
        assert!(matches!(
            loader.load_file(PathBuf::from("/no/such/datastet.toml")),
            Err(ConfigError::FileLoadError(_))
        ));

        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            loader.load_file(file.path()),
            Err(ConfigError::FileLoadError(_))
        ));
        assert!(loader.extract().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = ConfigBuilder::new()
            .with_consolidation_service("http://biblio:8080")
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: DatastetConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.consolidation, deserialized.consolidation);
        assert_eq!(config.propagation, deserialized.propagation);
    }
}
