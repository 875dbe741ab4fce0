use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use todosync::store::sea::todo;
use todosync::{Operation, RemoteStore, StoreError, SyncError, TaskId, TaskPatch, TodoDbBuilder, TodoList};

async fn memory_db(label: &str) -> todosync::TodoDb {
    let _ = env_logger::builder().is_test(true).try_init();
    TodoDbBuilder::new("sqlite::memory:")
        .build()
        .await
        .unwrap_or_else(|e| panic!("Failed to create TodoDb for {label}: {e}"))
}

fn temp_db_url() -> (std::path::PathBuf, String) {
    let path = std::env::temp_dir().join(format!("todosync-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());
    (path, url)
}

#[tokio::test]
async fn test_todo_db_basic_crud() {
    let db = memory_db("crud").await;

    // INSERT
    let inserted = db.insert_one("Buy milk").await.expect("Failed to insert");
    assert_eq!(inserted.task, "Buy milk");
    assert!(!inserted.completed);
    assert!(!inserted.id.as_str().is_empty());

    // SELECT all
    let all = db.list_all().await.expect("Failed to list");
    assert_eq!(all, vec![inserted.clone()]);

    // UPDATE, one field at a time
    db.update_by_id(&inserted.id, &TaskPatch::completed(true))
        .await
        .expect("Failed to toggle");
    db.update_by_id(&inserted.id, &TaskPatch::text("Buy bread"))
        .await
        .expect("Failed to edit");
    let row = todo::Entity::find_by_id(inserted.id.as_str().to_string())
        .one(db.inner())
        .await
        .expect("Failed to find by id")
        .expect("row should exist");
    assert_eq!(row.task, "Buy bread");
    assert!(row.completed);
    assert_eq!(row.created_at, inserted.created_at);

    // DELETE
    db.delete_by_id(&inserted.id).await.expect("Failed to delete");
    assert!(db.list_all().await.expect("Failed to list").is_empty());
}

#[tokio::test]
async fn test_todo_db_lists_newest_first() {
    let db = memory_db("ordering").await;

    let a = db.insert_one("a").await.unwrap();
    let b = db.insert_one("b").await.unwrap();
    let c = db.insert_one("c").await.unwrap();
    assert!(a.created_at < b.created_at && b.created_at < c.created_at);

    let ids: Vec<TaskId> = db.list_all().await.unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);
}

#[tokio::test]
async fn test_todo_db_reopened_keeps_new_rows_ahead() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (path, url) = temp_db_url();

    // A row written by another client whose clock runs an hour ahead.
    let ahead = {
        let db = TodoDbBuilder::new(&url).build().await.expect("Failed to create TodoDb");
        let future = todo::ActiveModel {
            id: Set("from-the-future".into()),
            task: Set("written ahead".into()),
            completed: Set(false),
            created_at: Set(db.insert_one("now").await.unwrap().created_at + 3_600_000_000),
        };
        future.insert(db.inner()).await.expect("Failed to insert row")
    };

    let reopened = TodoDbBuilder::new(&url).build().await.expect("Failed to reopen TodoDb");
    let fresh = reopened.insert_one("after restart").await.unwrap();
    assert!(fresh.created_at > ahead.created_at);

    let listed = reopened.list_all().await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0], fresh);
    assert_eq!(listed[1].id.as_str(), "from-the-future");

    drop(reopened);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_todo_db_insert_after_max_timestamp_returns_error() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (path, url) = temp_db_url();

    {
        let db = TodoDbBuilder::new(&url).build().await.expect("Failed to create TodoDb");
        let last = todo::ActiveModel {
            id: Set("last".into()),
            task: Set("end of time".into()),
            completed: Set(false),
            created_at: Set(i64::MAX),
        };
        last.insert(db.inner()).await.expect("Failed to insert row");
    }

    let reopened = TodoDbBuilder::new(&url).build().await.expect("Failed to reopen TodoDb");
    for _ in 0..2 {
        let err = reopened.insert_one("one more").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
    assert_eq!(reopened.list_all().await.unwrap().len(), 1);

    let list = TodoList::new(reopened);
    list.initialize().await.unwrap();
    let err = list.add("one more").await.unwrap_err();
    assert_eq!(err.operation(), Operation::InsertOne);
    assert_eq!(list.len(), 1);

    drop(list);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_todo_db_rejects_blank_task() {
    let db = memory_db("blank").await;
    let err = db.insert_one("").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn test_todo_db_acknowledges_unknown_ids() {
    let db = memory_db("unknown").await;
    let missing = TaskId::new("no-such-id");
    assert!(db.delete_by_id(&missing).await.is_ok());
    assert!(db.update_by_id(&missing, &TaskPatch::text("x")).await.is_ok());
    assert!(db.update_by_id(&missing, &TaskPatch::default()).await.is_ok());
}

#[tokio::test]
async fn test_todo_db_database_errors_surface() {
    let db = memory_db("dropped").await;
    db.inner()
        .execute_unprepared("DROP TABLE todos")
        .await
        .expect("Failed to drop table");

    let err = db.list_all().await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
}

#[tokio::test]
async fn test_list_mirrors_todo_db() {
    let list = TodoList::new(memory_db("mirror").await);
    list.initialize().await.expect("Failed to initialize");
    assert!(list.is_empty());

    let milk = list.add("buy milk").await.unwrap();
    let eggs = list.add("buy eggs").await.unwrap();
    list.update(&milk.id, TaskPatch::completed(true)).await.unwrap();
    list.delete(&eggs.id).await.unwrap();

    let local = list.items();
    let remote = list.store().list_all().await.unwrap();
    assert_eq!(local, remote);
    assert_eq!(local.len(), 1);
    assert!(local[0].completed);
}

#[tokio::test]
async fn test_list_failure_against_todo_db() {
    let list = TodoList::new(memory_db("failure").await);
    list.initialize().await.unwrap();
    let kept = list.add("keep").await.unwrap();

    list.store()
        .inner()
        .execute_unprepared("DROP TABLE todos")
        .await
        .unwrap();

    let err = list.update(&kept.id, TaskPatch::text("lost")).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::RemoteOperationFailed { op: Operation::UpdateById, cause: StoreError::Database(_) }
    ));
    assert_eq!(list.items(), vec![kept]);
}
