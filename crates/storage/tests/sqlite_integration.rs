use storage::repository::{ProgressStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrips_progress_values() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get_value("driving-exam:position").await.unwrap(), None);

    repo.set_value("driving-exam:position", "12").await.unwrap();
    repo.set_value("driving-exam:score", "9").await.unwrap();
    repo.set_value("driving-exam:position", "13").await.unwrap();

    assert_eq!(
        repo.get_value("driving-exam:position").await.unwrap().as_deref(),
        Some("13")
    );
    assert_eq!(
        repo.get_value("driving-exam:score").await.unwrap().as_deref(),
        Some("9")
    );

    repo.remove_value("driving-exam:score").await.unwrap();
    assert_eq!(repo.get_value("driving-exam:score").await.unwrap(), None);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    repo.set_value("brain-type:score", "40").await.unwrap();
    assert_eq!(
        repo.get_value("brain-type:score").await.unwrap().as_deref(),
        Some("40")
    );
}

#[tokio::test]
async fn storage_sqlite_wires_progress_store() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .progress
        .set_value("anti-bullying:position", "2")
        .await
        .unwrap();
    assert_eq!(
        storage
            .progress
            .get_value("anti-bullying:position")
            .await
            .unwrap()
            .as_deref(),
        Some("2")
    );
}
