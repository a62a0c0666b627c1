use crate::models::{NewTodo, Todo, TodoUpdate};
use crate::page::fetch_page;
use crate::{generate_id, Database, DatabaseError, Result};
use chrono::Utc;
use relay::{Page, PaginationArgs};
use tracing::{debug, info};

const SELECT_TODOS: &str =
    "SELECT id, owner_id, title, completed, created_at, updated_at FROM todos";

/// Todo storage operations
pub struct TodoStorage<'a> {
    db: &'a Database,
}

impl<'a> TodoStorage<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Creates a todo owned by `owner_id`.
    pub async fn create(&self, owner_id: &str, new_todo: NewTodo) -> Result<Todo> {
        validate_title(&new_todo.title)?;

        let now = Utc::now();
        let todo = Todo {
            id: generate_id(),
            owner_id: owner_id.to_string(),
            title: new_todo.title,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO todos (id, owner_id, title, completed, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&todo.id)
        .bind(&todo.owner_id)
        .bind(&todo.title)
        .bind(todo.completed)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(self.db.pool())
        .await?;

        info!("Created todo {} for user {}", todo.id, owner_id);
        Ok(todo)
    }

    pub async fn find(&self, id: &str) -> Result<Option<Todo>> {
        let sql = format!("{SELECT_TODOS} WHERE id = ?");
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(todo)
    }

    pub async fn get(&self, id: &str) -> Result<Todo> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Todo", id))
    }

    pub async fn update(&self, id: &str, update: TodoUpdate) -> Result<Todo> {
        let mut todo = self.get(id).await?;

        if let Some(title) = update.title {
            validate_title(&title)?;
            todo.title = title;
        }
        if let Some(completed) = update.completed {
            todo.completed = completed;
        }
        todo.updated_at = Utc::now();

        sqlx::query("UPDATE todos SET title = ?, completed = ?, updated_at = ? WHERE id = ?")
            .bind(&todo.title)
            .bind(todo.completed)
            .bind(todo.updated_at)
            .bind(&todo.id)
            .execute(self.db.pool())
            .await?;

        info!("Updated todo with id: {}", id);
        Ok(todo)
    }

    pub async fn set_completed(&self, id: &str, completed: bool) -> Result<Todo> {
        self.update(
            id,
            TodoUpdate {
                completed: Some(completed),
                ..TodoUpdate::default()
            },
        )
        .await
    }

    /// Deletes a todo and returns it as it was.
    pub async fn delete(&self, id: &str) -> Result<Todo> {
        let todo = self.get(id).await?;
        sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        info!("Deleted todo with id: {}", id);
        Ok(todo)
    }

    /// Lists todos, optionally only those of one owner.
    pub async fn list(
        &self,
        owner_id: Option<&str>,
        args: &PaginationArgs<String>,
    ) -> Result<Page<Todo>> {
        debug!("Listing todos for {:?}: {:?}", owner_id, args);
        let filter = owner_id.map(|owner_id| ("owner_id", owner_id));
        fetch_page(self.db.pool(), SELECT_TODOS, filter, args).await
    }

    pub async fn count(&self, owner_id: Option<&str>) -> Result<i64> {
        let (count,): (i64,) = match owner_id {
            Some(owner_id) => {
                sqlx::query_as("SELECT COUNT(*) FROM todos WHERE owner_id = ?")
                    .bind(owner_id)
                    .fetch_one(self.db.pool())
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM todos")
                    .fetch_one(self.db.pool())
                    .await?
            }
        };
        Ok(count)
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(DatabaseError::Validation("title must not be empty".into()));
    }
    Ok(())
}
