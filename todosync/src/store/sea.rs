//! SeaORM-backed store over a single `todos` table.
//!
//! ```ignore
//! use todosync::{TodoDbBuilder, TodoList};
//!
//! let db = TodoDbBuilder::new("sqlite:./todos.db?mode=rwc")
//!     .max_connections(4)
//!     .build()
//!     .await?;
//! let list = TodoList::new(db);
//! list.initialize().await?;
//! ```

use std::sync::Mutex;

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Schema, Set,
    sea_query::SqliteQueryBuilder,
};
use uuid::Uuid;

use super::{validate_text, RemoteStore, StoreError};
use crate::task::{CreationClock, Task, TaskId, TaskPatch};

/// The `todos` table.
pub mod todo {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "todos")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub task: String,
        pub completed: bool,
        pub created_at: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl From<todo::Model> for Task {
    fn from(model: todo::Model) -> Self {
        Task {
            id: TaskId::new(model.id),
            task: model.task,
            completed: model.completed,
            created_at: model.created_at,
        }
    }
}

/// A [`RemoteStore`] backed by a SeaORM connection.
pub struct TodoDb {
    inner: DatabaseConnection,
    clock: Mutex<CreationClock>,
}

impl TodoDb {
    /// Get a reference to the underlying SeaORM connection.
    pub fn inner(&self) -> &DatabaseConnection {
        &self.inner
    }

    /// Create the `todos` table if it does not exist yet.
    async fn create_table(db: &DatabaseConnection) -> Result<(), DbErr> {
        let schema = Schema::new(db.get_database_backend());
        let create_stmt = schema
            .create_table_from_entity(todo::Entity)
            .if_not_exists()
            .to_owned();
        db.execute_unprepared(&create_stmt.to_string(SqliteQueryBuilder))
            .await?;
        Ok(())
    }

    /// Latest `created_at` already stored, so new records sort ahead of it
    /// even after a restart with a lagging clock.
    async fn latest_created_at(db: &DatabaseConnection) -> Result<Option<i64>, DbErr> {
        let latest = todo::Entity::find()
            .order_by_desc(todo::Column::CreatedAt)
            .one(db)
            .await?;
        Ok(latest.map(|m| m.created_at))
    }

    fn next_created_at(&self) -> Result<i64, StoreError> {
        self.clock.lock().unwrap().next()
    }
}

#[async_trait::async_trait]
impl RemoteStore for TodoDb {
    async fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        let rows = todo::Entity::find()
            .order_by_desc(todo::Column::CreatedAt)
            .order_by_desc(todo::Column::Id)
            .all(&self.inner)
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn insert_one(&self, task: &str) -> Result<Task, StoreError> {
        validate_text(task)?;
        let created_at = self.next_created_at()?;

        let record = todo::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            task: Set(task.to_string()),
            completed: Set(false),
            created_at: Set(created_at),
        };
        let inserted = record.insert(&self.inner).await?;
        log::debug!("inserted todo {}", inserted.id);
        Ok(inserted.into())
    }

    async fn delete_by_id(&self, id: &TaskId) -> Result<(), StoreError> {
        let result = todo::Entity::delete_by_id(id.as_str().to_string())
            .exec(&self.inner)
            .await?;
        if result.rows_affected == 0 {
            log::debug!("delete matched no todo with id {id}");
        }
        Ok(())
    }

    async fn update_by_id(&self, id: &TaskId, fields: &TaskPatch) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }

        let changes = todo::ActiveModel {
            id: NotSet,
            task: fields.task.clone().map(Set).unwrap_or(NotSet),
            completed: fields.completed.map(Set).unwrap_or(NotSet),
            created_at: NotSet,
        };
        let result = todo::Entity::update_many()
            .set(changes)
            .filter(todo::Column::Id.eq(id.as_str()))
            .exec(&self.inner)
            .await?;
        if result.rows_affected == 0 {
            log::debug!("update matched no todo with id {id}");
        }
        Ok(())
    }
}

/// Builder for [`TodoDb`].
pub struct TodoDbBuilder {
    database_url: String,
    max_connections: Option<u32>,
    sqlx_logging: bool,
}

impl TodoDbBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            database_url: url.to_string(),
            max_connections: None,
            sqlx_logging: false,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Log every statement sqlx executes. Off by default.
    pub fn sqlx_logging(mut self, enabled: bool) -> Self {
        self.sqlx_logging = enabled;
        self
    }

    pub async fn build(self) -> Result<TodoDb, DbErr> {
        let mut opts = ConnectOptions::new(&self.database_url);
        opts.sqlx_logging(self.sqlx_logging);
        if let Some(max) = self.max_connections {
            opts.max_connections(max);
        }
        let inner = Database::connect(opts).await?;

        TodoDb::create_table(&inner).await?;

        let mut clock = CreationClock::default();
        if let Some(latest) = TodoDb::latest_created_at(&inner).await? {
            clock.advance_past(latest);
        }

        log::debug!("connected todo store at {}", self.database_url);
        Ok(TodoDb {
            inner,
            clock: Mutex::new(clock),
        })
    }
}
