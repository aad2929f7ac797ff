//! End-to-end tests for the `dl` workflow driven through `CliOptions`

#[path = "common/mod.rs"]
mod common;

use common::*;
use dl::cli::{self, CliOptions};
use std::fs;
use tempfile::TempDir;

fn options(urls: Vec<String>, output_dir: &std::path::Path) -> CliOptions {
    CliOptions {
        urls,
        output_dir: Some(output_dir.to_path_buf()),
        ..CliOptions::default()
    }
}

async fn run_capturing(options: &CliOptions) -> (dl::errors::AppResult<()>, String) {
    let mut out = Vec::new();
    let result = cli::run_to(options, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_manifest_flag_prints_current_manifest() {
    let options = CliOptions {
        show_manifest: true,
        ..CliOptions::default()
    };

    let (result, out) = run_capturing(&options).await;

    result.unwrap();
    assert!(out.contains("name = \"dl\""));
    assert!(out.contains("scripts = [\"dl\"]"));
    assert!(out.contains("license = \"BSD-3-Clause\""));
}

#[tokio::test]
async fn test_dry_run_prints_plan_and_writes_nothing() {
    let server = TestServer::start(vec![
        Route::ok("/a/data.zip", b"a"),
        Route::ok("/b/data.zip", b"b"),
    ])
    .await;
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("out");
    let options = CliOptions {
        dry_run: true,
        ..options(
            vec![server.url("/a/data.zip"), server.url("/b/data.zip")],
            &output_dir,
        )
    };

    let (result, out) = run_capturing(&options).await;

    result.unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("{}\tdata.zip", server.url("/a/data.zip")),
            format!("{}\tdata (1).zip", server.url("/b/data.zip")),
        ]
    );
    assert!(!output_dir.exists());
    assert_eq!(server.hits("/a/data.zip"), 0);
}

#[tokio::test]
async fn test_links_mode_downloads_filtered_links() {
    let page = r#"
        <a href="/dist/tool-1.0.tar.gz">tool</a>
        <a href="/dist/tool-1.0.sig">signature</a>
        <a href="/about.html">about</a>
    "#;
    let server = TestServer::start(vec![
        Route::html("/releases/", page),
        Route::ok("/dist/tool-1.0.tar.gz", b"tarball"),
        Route::ok("/dist/tool-1.0.sig", b"sig"),
    ])
    .await;
    let temp_dir = TempDir::new().unwrap();
    let options = CliOptions {
        links: true,
        extensions: vec!["gz".to_string()],
        ..options(vec![server.url("/releases/")], temp_dir.path())
    };

    let (result, out) = run_capturing(&options).await;

    result.unwrap();
    assert!(out.is_empty());
    assert_eq!(
        fs::read(temp_dir.path().join("tool-1.0.tar.gz")).unwrap(),
        b"tarball"
    );
    assert!(!temp_dir.path().join("tool-1.0.sig").exists());
    assert_eq!(server.hits("/dist/tool-1.0.sig"), 0);
}

#[tokio::test]
async fn test_links_mode_without_matches_succeeds_without_writing() {
    let server = TestServer::start(vec![Route::html(
        "/empty.html",
        r#"<a href="readme.txt">readme</a>"#,
    )])
    .await;
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("out");
    let options = CliOptions {
        links: true,
        extensions: vec!["iso".to_string()],
        ..options(vec![server.url("/empty.html")], &output_dir)
    };

    let (result, _) = run_capturing(&options).await;

    result.unwrap();
    assert!(!output_dir.exists());
    assert_eq!(server.hits("/readme.txt"), 0);
}

#[tokio::test]
async fn test_failed_download_fails_the_run_but_keeps_others() {
    let server = TestServer::start(vec![
        Route::ok("/good.bin", b"good"),
        Route::status("/gone.bin", 410),
    ])
    .await;
    let temp_dir = TempDir::new().unwrap();
    let options = options(
        vec![server.url("/gone.bin"), server.url("/good.bin")],
        temp_dir.path(),
    );

    let (result, _) = run_capturing(&options).await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("gone.bin"));
    assert_eq!(fs::read(temp_dir.path().join("good.bin")).unwrap(), b"good");
    assert!(!temp_dir.path().join("gone.bin").exists());
}

#[tokio::test]
async fn test_missing_page_fails_links_mode() {
    let server = TestServer::start(vec![]).await;
    let temp_dir = TempDir::new().unwrap();
    let options = CliOptions {
        links: true,
        ..options(vec![server.url("/missing/")], temp_dir.path())
    };

    let (result, _) = run_capturing(&options).await;

    assert!(matches!(
        result,
        Err(dl::errors::AppError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_config_file_and_flags_drive_the_run() {
    let server = TestServer::start(vec![Route::flaky("/retry.bin", b"eventually", 1)]).await;
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dl.toml");
    fs::write(
        &config_path,
        "retry_initial_delay_ms = 1\nretry_max_delay_ms = 2\nmax_retries = 0\n",
    )
    .unwrap();
    let options = CliOptions {
        config: Some(config_path),
        retries: Some(2),
        ..options(vec![server.url("/retry.bin")], temp_dir.path())
    };

    let (result, _) = run_capturing(&options).await;

    result.unwrap();
    assert_eq!(server.hits("/retry.bin"), 2);
    assert_eq!(
        fs::read(temp_dir.path().join("retry.bin")).unwrap(),
        b"eventually"
    );
}
