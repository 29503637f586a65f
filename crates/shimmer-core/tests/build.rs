//! End-to-end runs over generated project trees.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use shimmer_core::{CacheStore, Config, PipelineError, Shimmer, ShimmerError, MAP_FILE_NAME};
use std::path::{Path, PathBuf};

fn write_rgb(path: &Path, width: u32, height: u32, format: ImageFormat) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 120])
    }));
    img.save_with_format(path, format).unwrap();
}

fn config_for(root: &Path, base_path: &str) -> Config {
    let mut config = Config::default();
    config.site.root_dir = Some(root.to_path_buf());
    config.site.asset_dir = Some("assets".into());
    config.site.base_path = Some(base_path.into());
    config.site.cache_dir = Some(root.join(".cache/shimmer"));
    config.processing.parallel_workers = 4;
    config
}

fn map_path(root: &Path) -> PathBuf {
    root.join(".cache/shimmer").join(MAP_FILE_NAME)
}

#[tokio::test]
async fn test_full_run_writes_expected_record() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_rgb(&root.join("images/a.jpg"), 400, 200, ImageFormat::Jpeg);

    let summary = Shimmer::new(config_for(root, "/docs/"))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.map_path, map_path(root));
    assert_eq!(summary.stats.images, 1);

    let text = std::fs::read_to_string(map_path(root)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let record = &json["images/a.jpg"];

    assert_eq!(record["width"], 100);
    assert_eq!(record["height"], 50);
    assert_eq!(record["originalWidth"], 400);
    assert_eq!(record["originalHeight"], 200);
    assert_eq!(record["assetFileName"], "images/a.jpg");
    assert_eq!(record["assetUrl"], "assets/images/a.jpg");
    assert_eq!(record["assetUrlWithBase"], "/docs/assets/images/a.jpg");
    assert!(record["previewDataUrl"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(record["assetFileHash"].as_str().unwrap().len(), 10);
    assert_eq!(record["assetFullHash"].as_str().unwrap().len(), 44);
}

#[tokio::test]
async fn test_one_entry_per_image_and_others_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for i in 0..5 {
        write_rgb(&root.join(format!("img/{i}.png")), 40 + i, 30, ImageFormat::Png);
    }
    write_rgb(&root.join("photos/x.JPEG"), 64, 64, ImageFormat::Jpeg);
    std::fs::write(root.join("README.md"), "not an image").unwrap();
    write_rgb(&root.join("node_modules/pkg/logo.png"), 16, 16, ImageFormat::Png);

    let summary = Shimmer::new(config_for(root, "/"))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.table.len(), 6);
    assert!(summary.table.get("photos/x.JPEG").is_some());
    assert!(summary.table.get("node_modules/pkg/logo.png").is_none());
    for (_, record) in &summary.table {
        assert!(record.asset_url_with_base.starts_with('/'));
    }
}

#[tokio::test]
async fn test_empty_project_writes_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    Shimmer::new(config_for(dir.path(), "/"))
        .unwrap()
        .run()
        .await
        .unwrap();
    let text = std::fs::read_to_string(map_path(dir.path())).unwrap();
    assert_eq!(text.trim(), "{}");
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for i in 0..8 {
        write_rgb(
            &root.join(format!("d{}/f{i}.png", i % 2)),
            20 + i * 7,
            15 + i * 3,
            ImageFormat::Png,
        );
    }

    let shimmer = Shimmer::new(config_for(root, "/")).unwrap();
    shimmer.run().await.unwrap();
    let first = std::fs::read(map_path(root)).unwrap();
    shimmer.run().await.unwrap();
    let second = std::fs::read(map_path(root)).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_stale_cache_contents_are_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_rgb(&root.join("a.png"), 10, 10, ImageFormat::Png);
    let stale = root.join(".cache/shimmer/leftover.txt");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "old").unwrap();

    Shimmer::new(config_for(root, "/"))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert!(!stale.exists());
    assert!(map_path(root).is_file());
}

#[tokio::test]
async fn test_corrupt_image_leaves_previous_map_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_rgb(&root.join("ok.png"), 32, 32, ImageFormat::Png);

    let shimmer = Shimmer::new(config_for(root, "/")).unwrap();
    shimmer.run().await.unwrap();
    let before = std::fs::read(map_path(root)).unwrap();

    std::fs::write(root.join("broken.jpg"), [0xFF, 0xD8, 0xFF, 0xDB, 0x00]).unwrap();
    let err = shimmer.run().await.unwrap_err();
    match err {
        ShimmerError::Pipeline(e) => assert!(e.is_decode_error(), "unexpected error: {e}"),
        other => panic!("unexpected error: {other}"),
    }

    let after = std::fs::read(map_path(root)).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_identical_files_share_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("copy")).unwrap();
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(50, 40, |x, _| {
        Rgba([200, 40, 90, if x < 25 { 255 } else { 128 }])
    }));
    img.save_with_format(root.join("a.png"), ImageFormat::Png)
        .unwrap();
    std::fs::copy(root.join("a.png"), root.join("copy/a.png")).unwrap();

    let summary = Shimmer::new(config_for(root, "/"))
        .unwrap()
        .run()
        .await
        .unwrap();
    let a = summary.table.get("a.png").unwrap();
    let b = summary.table.get("copy/a.png").unwrap();
    assert_eq!(a.signature_base64, b.signature_base64);
    assert_eq!(a.preview_data_url, b.preview_data_url);
    assert_eq!(a.asset_file_hash, b.asset_file_hash);
    assert_ne!(a.asset_url, b.asset_url);
}

#[tokio::test]
async fn test_written_map_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_rgb(&root.join("x/y.png"), 120, 80, ImageFormat::Png);

    let mut config = config_for(root, "/base");
    config.output.pretty = true;
    let summary = Shimmer::new(config).unwrap().run().await.unwrap();

    let loaded = CacheStore::new(root.join(".cache/shimmer")).read().unwrap();
    assert_eq!(loaded, summary.table);
    assert_eq!(
        loaded.get("x/y.png").unwrap().asset_url_with_base,
        "/base/assets/x/y.png"
    );
}

#[tokio::test]
async fn test_cache_dir_above_root_is_rejected_and_sources_survive() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    let root = project.join("site");
    write_rgb(&root.join("a.png"), 16, 16, ImageFormat::Png);
    std::fs::write(project.join("precious.txt"), "keep me").unwrap();

    let mut config = config_for(&root, "/");
    config.site.cache_dir = Some(project.clone());
    assert!(matches!(
        Shimmer::new(config),
        Err(ShimmerError::Config(_))
    ));
    assert!(root.join("a.png").is_file());
    assert!(project.join("precious.txt").is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_tree_fails_run_and_keeps_previous_map() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_rgb(&root.join("ok.png"), 32, 32, ImageFormat::Png);

    let shimmer = Shimmer::new(config_for(root, "/")).unwrap();
    shimmer.run().await.unwrap();
    let before = std::fs::read(map_path(root)).unwrap();

    std::fs::create_dir_all(root.join("nested")).unwrap();
    std::os::unix::fs::symlink(root, root.join("nested/loop")).unwrap();
    let err = shimmer.run().await.unwrap_err();
    assert!(
        matches!(err, ShimmerError::Pipeline(PipelineError::Read { .. })),
        "unexpected error: {err}"
    );
    assert_eq!(std::fs::read(map_path(root)).unwrap(), before);
}
