mod common;

use common::assets::AssetDir;
use common::requests::{get, table};
use static_routes::{CacheDirective, StaticConfig, StaticError};

#[tokio::test]
async fn test_yaml_config_drives_routes() {
    let assets = AssetDir::with_files(&[("app.js", "1;"), ("app.js.map", "{}"), ("logo.svg", "<svg/>")]);
    let file = assets.path().join("static.yaml");
    std::fs::write(
        &file,
        format!(
            r#"
assets: {}
prefix: /assets
force_static: true
no_extension: true
ignore_patterns:
  - static.yaml
  - pattern: '\.map$'
headers:
  x-content-type-options: nosniff
max_age: 600
directive: private
"#,
            assets.path().display()
        ),
    )
    .unwrap();

    let config = StaticConfig::from_file(&file).unwrap();
    assert_eq!(config.directive, CacheDirective::Private);
    let routes = static_routes::build_routes(&config).await.unwrap();
    let paths: Vec<_> = routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/assets/app", "/assets/logo"]);

    let table = table(&config).await;
    let outcome = get(&table, "/assets/logo").await;
    assert_eq!(outcome.body(), b"<svg/>");
    assert_eq!(outcome.get_header("content-type"), Some("image/svg+xml"));
    assert_eq!(outcome.get_header("cache-control"), Some("private, max-age=600"));
    assert_eq!(outcome.get_header("x-content-type-options"), Some("nosniff"));
}

#[tokio::test]
async fn test_toml_config_defaults() {
    let assets = AssetDir::new();
    let file = assets.write("static.toml", "prefix = \"/files\"\n");
    let config = StaticConfig::from_file(&file).unwrap();
    assert_eq!(config.normalized_prefix(), "/files");
    assert_eq!(config.static_limit, 1024);
    assert_eq!(config.max_age, Some(86400));
    assert!(config.index_html);
    assert!(!config.force_static);
}

#[test]
fn test_bad_pattern_is_config_error() {
    let assets = AssetDir::new();
    let file = assets.write("static.yaml", "ignore_patterns:\n  - pattern: '('\n");
    let err = StaticConfig::from_file(&file).unwrap_err();
    assert!(matches!(err, StaticError::Config { .. }));
}
