mod helpers;

use helpers::fixtures::{create_flat_tree, create_media_tree, MEDIA_TREE};
use helpers::{engine_with, MemoryStorage};
use reelvault_core::{AppError, LocalAsset, SkipReason, UploadOutcome};
use reelvault_services::{event_channel, TransferEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn batch_uploads_every_supported_file() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    let engine = engine_with(storage.clone(), 3);

    let stats = engine.run_batch(tree.path(), "video/", true).await.unwrap();

    assert_eq!(stats.success_count, 3);
    assert_eq!(stats.skipped_count, 0);
    assert_eq!(stats.failed_count, 0);
    let expected_bytes: usize = MEDIA_TREE.iter().map(|(_, data)| data.len()).sum();
    assert_eq!(stats.total_bytes_transferred, expected_bytes as u64);
    assert!(!stats.cancelled);

    assert_eq!(
        storage.keys(),
        vec![
            "video/hls/720p/seg0.ts".to_string(),
            "video/hls/index.m3u8".to_string(),
            "video/intro.mp4".to_string(),
        ]
    );
    assert_eq!(
        storage.get("video/hls/index.m3u8").unwrap().content_type,
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(
        storage.get("video/hls/720p/seg0.ts").unwrap().content_type,
        "video/mp2t"
    );
    assert_eq!(storage.get("video/intro.mp4").unwrap().data, b"intro-video-bytes");
}

#[tokio::test]
async fn second_run_skips_everything() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    let engine = engine_with(storage.clone(), 3);

    engine.run_batch(tree.path(), "video/", true).await.unwrap();
    let second = engine.run_batch(tree.path(), "video/", true).await.unwrap();

    assert_eq!(second.success_count, 0);
    assert_eq!(second.skipped_count, 3);
    assert_eq!(second.total_bytes_transferred, 0);
    assert_eq!(storage.put_calls(), 3);
}

#[tokio::test]
async fn skip_existing_disabled_uploads_again() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    let engine = engine_with(storage.clone(), 3);

    engine.run_batch(tree.path(), "video/", false).await.unwrap();
    let second = engine.run_batch(tree.path(), "video/", false).await.unwrap();

    assert_eq!(second.success_count, 3);
    assert_eq!(storage.put_calls(), 6);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_batch() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    storage.fail_puts_for("video/hls/index.m3u8");
    let engine = engine_with(storage.clone(), 3);

    let stats = engine.run_batch(tree.path(), "video/", true).await.unwrap();

    assert_eq!(stats.success_count, 2);
    assert_eq!(stats.failed_count, 1);
    assert!(stats.has_failures());
    assert!(storage.get("video/hls/index.m3u8").is_none());
}

#[tokio::test]
async fn counts_add_up_to_files_scanned() {
    let tree = create_flat_tree(7);
    let storage = Arc::new(MemoryStorage::new());
    storage.seed("media/clip0.mp4", b"old");
    storage.seed("media/clip1.mp4", b"old");
    storage.fail_puts_for("media/clip2.mp4");
    let engine = engine_with(storage.clone(), 2);

    let stats = engine.run_batch(tree.path(), "media", true).await.unwrap();

    assert_eq!(stats.skipped_count, 2);
    assert_eq!(stats.failed_count, 1);
    assert_eq!(stats.success_count, 4);
    assert_eq!(stats.total(), 7);
    assert_eq!(storage.get("media/clip0.mp4").unwrap().data, b"old");
}

#[tokio::test]
async fn existence_errors_fall_back_to_uploading() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    storage.seed("video/intro.mp4", b"old");
    storage.fail_heads();
    let engine = engine_with(storage.clone(), 3);

    let stats = engine.run_batch(tree.path(), "video/", true).await.unwrap();

    assert_eq!(stats.success_count, 3);
    assert_eq!(stats.skipped_count, 0);
    assert_eq!(
        storage.get("video/intro.mp4").unwrap().data,
        b"intro-video-bytes"
    );
}

#[tokio::test]
async fn unreachable_storage_aborts_before_any_transfer() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    storage.set_unreachable();
    let engine = engine_with(storage.clone(), 3);

    let result = engine.run_batch(tree.path(), "video/", true).await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
    assert_eq!(storage.put_calls(), 0);
}

#[tokio::test]
async fn storage_lost_mid_run_aborts_the_batch() {
    let tree = create_flat_tree(6);
    let storage = Arc::new(MemoryStorage::new());
    storage.drop_connection_on_puts();
    let engine = engine_with(storage.clone(), 1);

    let result = engine.run_batch(tree.path(), "video/", false).await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
    assert!(storage.put_calls() < 6);
    assert!(storage.keys().is_empty());
}

#[tokio::test]
async fn vanished_file_is_failed_without_a_put() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    let engine = engine_with(storage.clone(), 3);

    let path = tree.path().join("intro.mp4");
    let asset = LocalAsset::new(&path, 17);
    std::fs::remove_file(&path).unwrap();

    let outcome = engine.upload_one(&asset, "video/intro.mp4", true).await;

    assert!(outcome.is_failed());
    assert_eq!(storage.put_calls(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_file_fails_alone() {
    use std::os::unix::fs::PermissionsExt;

    let tree = create_media_tree();
    let locked = tree.path().join("hls/index.m3u8");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::File::open(&locked).is_ok() {
        // Running with CAP_DAC_OVERRIDE; permissions are not enforced.
        return;
    }

    let storage = Arc::new(MemoryStorage::new());
    let engine = engine_with(storage.clone(), 3);

    let stats = engine.run_batch(tree.path(), "video/", true).await.unwrap();

    assert_eq!(stats.failed_count, 1);
    assert_eq!(stats.success_count, 2);
    assert_eq!(stats.total(), 3);
    assert!(storage.get("video/hls/index.m3u8").is_none());
    assert_eq!(storage.put_calls(), 2);
}

#[tokio::test]
async fn missing_root_is_not_found() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    let engine = engine_with(storage, 3);

    let result = engine
        .run_batch(&tree.path().join("does-not-exist"), "video/", true)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn concurrency_never_exceeds_limit() {
    let tree = create_flat_tree(8);
    let storage = Arc::new(MemoryStorage::new());
    storage.delay_puts(Duration::from_millis(30));
    let engine = engine_with(storage.clone(), 2);

    let stats = engine.run_batch(tree.path(), "video/", true).await.unwrap();

    assert_eq!(stats.success_count, 8);
    assert!(storage.max_active_puts() >= 1);
    assert!(storage.max_active_puts() <= 2);
}

#[tokio::test]
async fn cancellation_aborts_in_flight_transfers() {
    let tree = create_flat_tree(5);
    let storage = Arc::new(MemoryStorage::new());
    storage.delay_puts(Duration::from_secs(30));
    let (events_tx, mut events_rx) = event_channel();
    let engine = engine_with(storage.clone(), 2).with_events(events_tx);

    let cancel = CancellationToken::new();
    let run = {
        let cancel = cancel.clone();
        let root = tree.path().to_path_buf();
        tokio::spawn(async move {
            engine
                .run_batch_with_cancel(&root, "video/", true, &cancel)
                .await
        })
    };

    loop {
        match events_rx.recv().await {
            Some(TransferEvent::Started { .. }) => break,
            Some(_) => continue,
            None => panic!("event channel closed before any transfer started"),
        }
    }
    cancel.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("run did not stop after cancellation")
        .unwrap()
        .unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.success_count, 0);
    assert!(stats.failed_count >= 1);
    assert!(stats.total() <= 5);
    assert_eq!(stats.failed_count, stats.total());
    assert!(storage.keys().is_empty());
}

#[tokio::test]
async fn events_report_each_file_once() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    storage.seed("video/intro.mp4", b"old");
    let (events_tx, mut events_rx) = event_channel();
    let engine = engine_with(storage, 3).with_events(events_tx);

    let stats = engine.run_batch(tree.path(), "video/", true).await.unwrap();
    drop(engine);

    let mut finished: HashMap<String, UploadOutcome> = HashMap::new();
    let mut started: Vec<String> = Vec::new();
    let mut last_progress: HashMap<String, u64> = HashMap::new();
    while let Some(event) = events_rx.recv().await {
        match event {
            TransferEvent::Started { key, .. } => {
                assert!(!finished.contains_key(&key));
                started.push(key);
            }
            TransferEvent::Progress {
                key,
                bytes_sent,
                total_bytes,
            } => {
                let previous = last_progress.insert(key, bytes_sent).unwrap_or(0);
                assert!(bytes_sent > previous);
                assert!(bytes_sent <= total_bytes);
            }
            TransferEvent::Finished { key, outcome } => {
                assert!(finished.insert(key, outcome).is_none());
            }
        }
    }

    assert_eq!(finished.len() as u64, stats.total());
    assert_eq!(
        finished.get("video/intro.mp4"),
        Some(&UploadOutcome::Skipped {
            reason: SkipReason::AlreadyExists
        })
    );
    assert_eq!(started.len(), 2);
    assert!(!started.contains(&"video/intro.mp4".to_string()));
}

#[tokio::test]
async fn upload_single_ignores_existing_objects() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    storage.seed("custom/intro.mp4", b"old");
    let engine = engine_with(storage.clone(), 3);

    let outcome = engine
        .upload_single(&tree.path().join("intro.mp4"), "custom/intro.mp4")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        UploadOutcome::Success {
            bytes_transferred: b"intro-video-bytes".len() as u64
        }
    );
    assert_eq!(
        storage.get("custom/intro.mp4").unwrap().data,
        b"intro-video-bytes"
    );
}

#[tokio::test]
async fn upload_single_missing_file_is_not_found() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    let engine = engine_with(storage.clone(), 3);

    let result = engine
        .upload_single(&tree.path().join("gone.mp4"), "video/gone.mp4")
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(storage.put_calls(), 0);
}

#[tokio::test]
async fn upload_single_unreachable_storage_is_configuration_error() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    storage.drop_connection_on_puts();
    let engine = engine_with(storage.clone(), 3);

    let result = engine
        .upload_single(&tree.path().join("intro.mp4"), "video/intro.mp4")
        .await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn upload_single_rejected_put_is_failed_outcome() {
    let tree = create_media_tree();
    let storage = Arc::new(MemoryStorage::new());
    storage.fail_puts_for("video/intro.mp4");
    let engine = engine_with(storage.clone(), 3);

    let outcome = engine
        .upload_single(&tree.path().join("intro.mp4"), "video/intro.mp4")
        .await
        .unwrap();

    assert!(outcome.is_failed());
}
