use std::fs;

use async_trait::async_trait;
use reqwest::StatusCode;

use batchcast_core::{
    ApiError, ApiResult, CheckpointStore, CsvRowSource, IngestMode, IngestRequest, Ingestor,
    MediaObject, Receipt, RemoteRegistration, SourceResult, VideoMetadata, VideoPlatform, VideoRow,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create { name: String },
    Register { video_id: String, asset_path: String },
    Ingest { video_id: String, request: serde_json::Value },
}

/// Records every platform call and answers from a scripted set of failures.
#[derive(Default)]
struct MockPlatform {
    calls: Vec<Call>,
    created: u64,
    fail_create_for: Vec<String>,
    fail_register_for: Vec<String>,
    reject_auth: bool,
}

impl MockPlatform {
    fn rejection(operation: &'static str) -> ApiError {
        ApiError::Status {
            operation,
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: "rejected by test".into(),
        }
    }

    fn created_names(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Create { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl VideoPlatform for MockPlatform {
    async fn create_video(&mut self, metadata: &VideoMetadata) -> ApiResult<MediaObject> {
        if self.reject_auth {
            return Err(ApiError::Auth(batchcast_core::AuthError::Rejected {
                status: StatusCode::UNAUTHORIZED,
                body: "bad credentials".into(),
            }));
        }
        self.calls.push(Call::Create {
            name: metadata.name.clone(),
        });
        if self.fail_create_for.contains(&metadata.name) {
            return Err(Self::rejection("create media object"));
        }
        self.created += 1;
        Ok(MediaObject {
            id: format!("vid-{}", self.created),
        })
    }

    async fn register_remote_asset(
        &mut self,
        video_id: &str,
        registration: &RemoteRegistration,
    ) -> ApiResult<Receipt> {
        self.calls.push(Call::Register {
            video_id: video_id.to_string(),
            asset_path: registration.asset_path.to_string(),
        });
        if self.fail_register_for.contains(&video_id.to_string()) {
            return Err(Self::rejection("register remote source"));
        }
        Ok(Receipt { id: "asset-1".into() })
    }

    async fn submit_ingest_request(
        &mut self,
        video_id: &str,
        request: &IngestRequest,
    ) -> ApiResult<Receipt> {
        self.calls.push(Call::Ingest {
            video_id: video_id.to_string(),
            request: serde_json::to_value(request).unwrap(),
        });
        Ok(Receipt { id: "req-1".into() })
    }
}

fn row(index: u64, name: &str, url: &str) -> VideoRow {
    VideoRow {
        index,
        name: name.to_string(),
        video_url: url.to_string(),
        ..VideoRow::default()
    }
}

fn feed(rows: Vec<VideoRow>) -> impl Iterator<Item = SourceResult<VideoRow>> {
    rows.into_iter().map(Ok)
}

fn ingestor(dir: &tempfile::TempDir, mode: IngestMode) -> Ingestor<MockPlatform> {
    Ingestor::new(
        MockPlatform::default(),
        CheckpointStore::new(dir.path()),
        mode,
        "test-profile",
    )
}

#[tokio::test]
async fn invalid_row_is_skipped_and_checkpoint_clears_at_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);

    let summary = ingestor
        .run(feed(vec![
            row(0, "first", "https://cdn/a.mp4"),
            row(1, "second", "ftp://cdn/b.mp4"),
            row(2, "third", "https://cdn/c.mp4"),
        ]))
        .await
        .unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);

    let store = CheckpointStore::new(dir.path());
    assert_eq!(store.load().unwrap(), None, "checkpoint cleared after full pass");
    assert!(store.path().exists());
    assert_eq!(ingestor.platform().created_names(), vec!["first", "third"]);
}

#[tokio::test]
async fn resume_never_resubmits_checkpointed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    store.advance(0).unwrap();

    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);
    let summary = ingestor
        .run(feed(vec![
            row(0, "first", "https://cdn/a.mp4"),
            row(1, "second", "https://cdn/b.mp4"),
        ]))
        .await
        .unwrap();

    assert_eq!(summary.attempted, 1);
    assert_eq!(ingestor.platform().created_names(), vec!["second"]);
}

#[tokio::test]
async fn crash_after_checkpoint_resumes_at_next_row() {
    let dir = tempfile::tempdir().unwrap();
    // First pass dies after row 5 was checkpointed: simulate by seeding the
    // store the way a killed run leaves it.
    CheckpointStore::new(dir.path()).advance(5).unwrap();

    let rows: Vec<VideoRow> = (0..8)
        .map(|idx| row(idx, &format!("video-{idx}"), "https://cdn/v.mp4"))
        .collect();
    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);
    let summary = ingestor.run(feed(rows)).await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(
        ingestor.platform().created_names(),
        vec!["video-6", "video-7"]
    );
}

#[tokio::test]
async fn failed_create_leaves_row_uncheckpointed_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);
    ingestor.platform_mut().fail_create_for = vec!["second".to_string()];

    let summary = ingestor
        .run(feed(vec![
            row(0, "first", "https://cdn/a.mp4"),
            row(1, "second", "https://cdn/b.mp4"),
            row(2, "third", "https://cdn/c.mp4"),
        ]))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(
        ingestor.platform().created_names(),
        vec!["first", "second", "third"],
        "the batch continues past a failed row"
    );
}

#[tokio::test]
async fn failed_registration_keeps_checkpoint_behind_created_object() {
    let dir = tempfile::tempdir().unwrap();
    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);
    ingestor.platform_mut().fail_register_for = vec!["vid-1".to_string()];

    let summary = ingestor
        .run(feed(vec![row(0, "only", "https://cdn/a.mp4")]))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 0);
    // The media object was created before the registration failed; the row
    // stays un-checkpointed so a re-run retries it whole.
    assert_eq!(ingestor.platform().created_names(), vec!["only"]);
}

#[tokio::test]
async fn auth_rejection_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);
    ingestor.platform_mut().reject_auth = true;

    let result = ingestor
        .run(feed(vec![
            row(0, "first", "https://cdn/a.mp4"),
            row(1, "second", "https://cdn/b.mp4"),
        ]))
        .await;

    assert!(matches!(result, Err(batchcast_core::IngestError::Auth(_))));
    assert!(ingestor.platform().calls.is_empty());
}

#[tokio::test]
async fn remote_assets_mode_routes_by_container() {
    let dir = tempfile::tempdir().unwrap();
    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);

    ingestor
        .run(feed(vec![
            row(0, "progressive", "https://cdn/a.mp4"),
            row(1, "hls", "https://cdn/m.m3u8"),
            row(2, "dash", "https://cdn/m.mpd"),
        ]))
        .await
        .unwrap();

    let registered: Vec<_> = ingestor
        .platform()
        .calls
        .iter()
        .filter_map(|call| match call {
            Call::Register { asset_path, .. } => Some(asset_path.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        registered,
        vec!["assets/renditions", "assets/hls_manifest", "assets/dash_manifest"]
    );
}

#[tokio::test]
async fn master_mode_submits_master_ingest_and_never_registers_assets() {
    let dir = tempfile::tempdir().unwrap();
    let mut ingestor = ingestor(&dir, IngestMode::Master);

    let summary = ingestor
        .run(feed(vec![row(0, "movie", "https://cdn/movie.mov")]))
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    let calls = &ingestor.platform().calls;
    assert!(calls
        .iter()
        .all(|call| !matches!(call, Call::Register { .. })));
    let ingest = calls
        .iter()
        .find_map(|call| match call {
            Call::Ingest { request, .. } => Some(request),
            _ => None,
        })
        .expect("master ingest submitted");
    assert_eq!(
        *ingest,
        serde_json::json!({
            "profile": "test-profile",
            "master": { "url": "https://cdn/movie.mov" },
        })
    );
}

#[tokio::test]
async fn poster_stands_in_for_missing_thumbnail() {
    let dir = tempfile::tempdir().unwrap();
    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);

    let mut with_poster = row(0, "pictured", "https://cdn/a.mp4");
    with_poster.poster = "https://cdn/poster.png".to_string();
    let mut without_images = row(1, "bare", "https://cdn/b.mp4");
    without_images.thumbnail = String::new();

    ingestor
        .run(feed(vec![with_poster, without_images]))
        .await
        .unwrap();

    let ingests: Vec<_> = ingestor
        .platform()
        .calls
        .iter()
        .filter_map(|call| match call {
            Call::Ingest { request, .. } => Some(request.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(ingests.len(), 1, "rows without a poster skip image ingest");
    assert_eq!(
        ingests[0],
        serde_json::json!({
            "profile": "test-profile",
            "poster": { "url": "https://cdn/poster.png" },
            "thumbnail": { "url": "https://cdn/poster.png" },
        })
    );
}

#[tokio::test]
async fn unknown_container_fails_the_row_after_creation() {
    let dir = tempfile::tempdir().unwrap();
    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);

    // .mov passes URL validation for remote mode but has no registrable
    // container mapping.
    let summary = ingestor
        .run(feed(vec![row(0, "quicktime", "https://cdn/a.mov")]))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(ingestor.platform().created_names(), vec!["quicktime"]);
}

#[tokio::test]
async fn end_to_end_from_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("remote_src.csv");
    fs::write(
        &csv_path,
        "name,video_url,tags,description,long_description,poster,thumbnail\n\
         First,https://cdn/a.mp4,\"a, b\",short,long,,\n\
         Second,https://cdn/bad.txt,,,,,\n\
         Third,https://cdn/c.m3u8,,,,,\n",
    )
    .unwrap();

    let mut ingestor = ingestor(&dir, IngestMode::RemoteAssets);
    let summary = ingestor
        .run(CsvRowSource::open(&csv_path).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(ingestor.platform().created_names(), vec!["First", "Third"]);
    assert_eq!(
        fs::read_to_string(dir.path().join("last_processed_row.txt")).unwrap(),
        "",
        "full pass leaves an empty checkpoint file"
    );
}
