use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Partial update. Absent fields leave the stored value untouched; an
/// explicit `"description": null` clears the description.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

// Only runs when the key is present, so `null` becomes `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UpdateTodo {
    pub fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

/// Public view of a todo; the owner id stays server side.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TodoRead {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl From<Todo> for TodoRead {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Todo {
        Todo {
            id: 1,
            title: "buy milk".into(),
            description: Some("semi-skimmed".into()),
            completed: false,
            user_id: 7,
        }
    }

    #[test]
    fn title_only_update_keeps_other_fields() {
        let mut todo = sample();
        UpdateTodo {
            title: Some("new".into()),
            ..Default::default()
        }
        .apply(&mut todo);

        assert_eq!(todo.title, "new");
        assert_eq!(todo.description.as_deref(), Some("semi-skimmed"));
        assert!(!todo.completed);
        assert_eq!(todo.user_id, 7);
    }

    #[test]
    fn partial_payload_deserializes_missing_fields_as_none() {
        let update: UpdateTodo = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert_eq!(update.completed, Some(true));
    }

    #[test]
    fn explicit_null_clears_description() {
        let update: UpdateTodo = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(update.description, Some(None));

        let mut todo = sample();
        update.apply(&mut todo);
        assert!(todo.description.is_none());
        assert_eq!(todo.title, "buy milk");
    }

    #[test]
    fn create_defaults_completed_to_false() {
        let create: CreateTodo = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert!(!create.completed);
        assert!(create.description.is_none());
    }
}
