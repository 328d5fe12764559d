use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::models::{todo::Todo, user::User};

const USER_COLUMNS: &str = "id, username, password, created_at";
const TODO_COLUMNS: &str = "id, title, description, completed, user_id";

/// Persistence for users and their todos. Cloning shares the pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Single-connection in-memory database. Every pooled connection would
    /// otherwise see its own empty database, so the one connection is never
    /// recycled.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            completed BOOLEAN NOT NULL DEFAULT 0,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
        );"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_user_id ON todos (user_id);")
            .execute(&self.pool)
            .await?;

        tracing::debug!("Schema ready");
        Ok(())
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password) VALUES (?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// Removes the user and, through the foreign key, their todos.
    pub async fn delete_user(&self, id: i64) -> Result<bool, sqlx::Error> {
        let rows_affected = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }

    pub async fn insert_todo(
        &self,
        user_id: i64,
        title: &str,
        description: Option<&str>,
        completed: bool,
    ) -> Result<Todo, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (title, description, completed, user_id) VALUES (?, ?, ?, ?) RETURNING {TODO_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(completed)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_todos(&self, user_id: i64) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_todo(&self, id: i64) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Writes every mutable column of `todo` back to its row.
    pub async fn update_todo(&self, todo: &Todo) -> Result<Todo, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET title = ?, description = ?, completed = ? WHERE id = ? RETURNING {TODO_COLUMNS}"
        ))
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete_todo(&self, id: i64) -> Result<bool, sqlx::Error> {
        let rows_affected = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_username_is_unique_violation() {
        let store = Store::in_memory().await.unwrap();
        store.insert_user("alice", "hash").await.unwrap();

        let err = store.insert_user("alice", "other").await.unwrap_err();
        assert!(err.as_database_error().unwrap().is_unique_violation());
    }

    #[tokio::test]
    async fn lookup_by_username() {
        let store = Store::in_memory().await.unwrap();
        let created = store.insert_user("alice", "hash").await.unwrap();

        let found = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password, "hash");
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn todos_are_scoped_to_owner() {
        let store = Store::in_memory().await.unwrap();
        let alice = store.insert_user("alice", "h").await.unwrap();
        let bob = store.insert_user("bob", "h").await.unwrap();

        store.insert_todo(alice.id, "a1", None, false).await.unwrap();
        store.insert_todo(bob.id, "b1", Some("d"), true).await.unwrap();
        store.insert_todo(alice.id, "a2", None, false).await.unwrap();

        let titles: Vec<_> = store
            .list_todos(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["a1", "a2"]);
        assert_eq!(store.list_todos(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn todo_requires_existing_user() {
        let store = Store::in_memory().await.unwrap();
        let err = store.insert_todo(42, "orphan", None, false).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn deleting_user_cascades_todos() {
        let store = Store::in_memory().await.unwrap();
        let alice = store.insert_user("alice", "h").await.unwrap();
        let todo = store.insert_todo(alice.id, "a1", None, false).await.unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());
        assert!(store.find_todo(todo.id).await.unwrap().is_none());
        assert!(!store.delete_user(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_and_delete_todo() {
        let store = Store::in_memory().await.unwrap();
        let alice = store.insert_user("alice", "h").await.unwrap();
        let mut todo = store.insert_todo(alice.id, "a1", None, false).await.unwrap();

        todo.completed = true;
        let updated = store.update_todo(&todo).await.unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "a1");

        assert!(store.delete_todo(todo.id).await.unwrap());
        assert!(!store.delete_todo(todo.id).await.unwrap());
    }
}
