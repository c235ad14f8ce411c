use std::sync::Arc;

use sharex::config::SecurityConfig;
use sharex::db::{NewFile, Store};
use sharex::services::{
    DenialReason, FileError, FileService, SeaOrmFileService, SeaOrmUserService, UploadRequest,
    UserError, UserService,
};

fn fast_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

async fn spawn_store() -> Store {
    let db_path = std::env::temp_dir().join(format!("sharex-svc-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite://{}", db_path.display()))
        .await
        .expect("Failed to open store")
}

async fn setup() -> (Store, SeaOrmUserService, Arc<SeaOrmFileService>, String) {
    let store = spawn_store().await;
    let users = SeaOrmUserService::new(store.clone(), fast_security());
    let files = Arc::new(SeaOrmFileService::new(store.clone(), fast_security()));

    let owner = users
        .register("owner", "owner@example.com", "hunter22")
        .await
        .unwrap();

    (store, users, files, owner.user_id)
}

fn upload_request(owner: &str, limit: Option<i64>) -> UploadRequest {
    UploadRequest {
        content: b"payload".to_vec(),
        original_file_name: String::new(),
        owner_user_id: owner.to_string(),
        password: None,
        download_limit: limit,
        expiry_date: None,
    }
}

#[tokio::test]
async fn test_record_download_counts_every_call() {
    let (_, _, files, owner) = setup().await;
    let file_id = files.upload(upload_request(&owner, None)).await.unwrap();

    for _ in 0..4 {
        files.record_download(&file_id).await.unwrap();
    }

    let record = files.metadata(&file_id).await.unwrap();
    assert_eq!(record.download_count, 4);

    // Missing files are ignored rather than reported
    assert!(files.record_download("missing").await.is_ok());
}

#[tokio::test]
async fn test_upload_defaults() {
    let (_, _, files, owner) = setup().await;
    let file_id = files.upload(upload_request(&owner, None)).await.unwrap();

    let record = files.metadata(&file_id).await.unwrap();
    assert_eq!(record.original_file_name, "file");
    assert_eq!(record.download_count, 0);
    assert_eq!(record.file_size, 7);
    assert!(!record.is_password_protected());
    assert_eq!(files.count_for_owner(&owner).await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_downloads_respect_limit() {
    let (_, _, files, owner) = setup().await;
    let file_id = files.upload(upload_request(&owner, Some(1))).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let files = Arc::clone(&files);
        let file_id = file_id.clone();
        handles.push(tokio::spawn(
            async move { files.download(&file_id, None).await },
        ));
    }

    let mut served = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => served += 1,
            Err(FileError::AccessDenied(DenialReason::LimitReached)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(served, 1);
    assert_eq!(files.metadata(&file_id).await.unwrap().download_count, 1);
}

#[tokio::test]
async fn test_zero_limit_record_is_never_served() {
    let (store, _, files, owner) = setup().await;

    let record = store
        .add_file(NewFile {
            original_file_name: "legacy.bin".to_string(),
            content: vec![1, 2, 3],
            owner_user_id: owner,
            password_hash: None,
            download_limit: Some(0),
            expiry_date: None,
        })
        .await
        .unwrap();

    let result = files.download(&record.file_id, None).await;
    assert!(matches!(
        result,
        Err(FileError::AccessDenied(DenialReason::LimitReached))
    ));
}

#[tokio::test]
async fn test_password_checked_only_when_other_gates_pass() {
    let (_, _, files, owner) = setup().await;

    let mut request = upload_request(&owner, None);
    request.password = Some("letmein".to_string());
    let file_id = files.upload(request).await.unwrap();

    assert!(matches!(
        files.download(&file_id, None).await,
        Err(FileError::AccessDenied(DenialReason::PasswordRequired))
    ));
    assert!(matches!(
        files.download(&file_id, Some("nope")).await,
        Err(FileError::AccessDenied(DenialReason::WrongPassword))
    ));

    let file = files.download(&file_id, Some("letmein")).await.unwrap();
    assert_eq!(file.content, b"payload");
    assert_eq!(files.metadata(&file_id).await.unwrap().download_count, 1);
}

#[tokio::test]
async fn test_download_serves_content_only_after_counting() {
    let (_, _, files, owner) = setup().await;

    assert!(matches!(
        files.download("missing", None).await,
        Err(FileError::NotFound)
    ));

    let file_id = files.upload(upload_request(&owner, Some(2))).await.unwrap();

    let first = files.download(&file_id, None).await.unwrap();
    assert_eq!(first.content, b"payload");
    assert_eq!(first.record.file_id, file_id);
    assert_eq!(files.metadata(&file_id).await.unwrap().download_count, 1);

    files.download(&file_id, None).await.unwrap();
    assert!(matches!(
        files.download(&file_id, None).await,
        Err(FileError::AccessDenied(DenialReason::LimitReached))
    ));

    // Denied attempts leave the counter alone
    assert_eq!(files.metadata(&file_id).await.unwrap().download_count, 2);
}

#[tokio::test]
async fn test_non_positive_limit_is_rejected() {
    let (_, _, files, owner) = setup().await;

    for limit in [0, -1] {
        let result = files.upload(upload_request(&owner, Some(limit))).await;
        assert!(matches!(result, Err(FileError::Validation(_))));
    }
    assert_eq!(files.count_for_owner(&owner).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_registration_leaves_first_user_intact() {
    let (_, users, _, owner) = setup().await;

    let result = users
        .register("owner", "someone@example.com", "different1")
        .await;
    assert!(matches!(result, Err(UserError::DuplicateIdentity)));

    let result = users
        .register("someone", "owner@example.com", "different1")
        .await;
    assert!(matches!(result, Err(UserError::DuplicateIdentity)));

    let user = users.authenticate("owner", "hunter22").await.unwrap();
    assert_eq!(user.user_id, owner);
    assert!(matches!(
        users.authenticate("owner", "different1").await,
        Err(UserError::InvalidCredential)
    ));
}

async fn race_registrations(
    users: Arc<SeaOrmUserService>,
    identities: Vec<(String, String)>,
) -> (usize, Vec<UserError>) {
    let mut handles = Vec::new();
    for (username, email) in identities {
        let users = Arc::clone(&users);
        handles.push(tokio::spawn(async move {
            users.register(&username, &email, "hunter22").await
        }));
    }

    let mut created = 0;
    let mut failures = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => failures.push(e),
        }
    }
    (created, failures)
}

#[tokio::test]
async fn test_concurrent_registration_same_username() {
    let store = spawn_store().await;
    let users = Arc::new(SeaOrmUserService::new(store, fast_security()));

    let identities = (0..8)
        .map(|i| ("racer".to_string(), format!("r{i}@example.com")))
        .collect();
    let (created, failures) = race_registrations(Arc::clone(&users), identities).await;

    assert_eq!(created, 1);
    assert_eq!(failures.len(), 7);
    for failure in failures {
        assert!(
            matches!(failure, UserError::DuplicateIdentity),
            "unexpected error: {failure}"
        );
    }
    assert!(users.find_by_username("racer").await.unwrap().is_some());
}

#[tokio::test]
async fn test_concurrent_registration_same_email() {
    let store = spawn_store().await;
    let users = Arc::new(SeaOrmUserService::new(store, fast_security()));

    let identities = (0..8)
        .map(|i| (format!("racer{i}"), "shared@example.com".to_string()))
        .collect();
    let (created, failures) = race_registrations(users, identities).await;

    assert_eq!(created, 1);
    assert_eq!(failures.len(), 7);
    for failure in failures {
        assert!(
            matches!(failure, UserError::DuplicateIdentity),
            "unexpected error: {failure}"
        );
    }
}

#[tokio::test]
async fn test_find_user() {
    let (_, users, _, owner) = setup().await;

    let by_id = users.find_by_id(&owner).await.unwrap().unwrap();
    assert_eq!(by_id.username, "owner");

    let by_name = users.find_by_username("owner").await.unwrap().unwrap();
    assert_eq!(by_name.user_id, owner);

    assert!(users.find_by_id("nope").await.unwrap().is_none());
}
