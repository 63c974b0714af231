//! Small category API served by `api-envelope serve`.
use std::sync::Arc;

use api_envelope::{
    ActionConfig, ApiError, AuthenticationError, Data, Fault, FormErrors, Reply, Serializable,
    core::ExposedField, create_action_middleware,
};
use axum::{
    Router,
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    routing::get,
};
use eyre::WrapErr;
use serde::Deserialize;

const KNOWN_ID: i64 = 42;
const NOT_FOUND_CODE: i64 = 12;

#[derive(Debug, Clone)]
struct Category {
    id: i64,
    name: String,
    parent: Option<Arc<Category>>,
    children: Vec<Arc<Category>>,
}

impl Category {
    fn sample() -> Self {
        let leaf = |id: i64, name: &str| {
            Arc::new(Category {
                id,
                name: name.to_string(),
                parent: None,
                children: Vec::new(),
            })
        };

        Category {
            id: KNOWN_ID,
            name: "foobar".to_string(),
            parent: Some(leaf(1, "root")),
            children: vec![leaf(43, "foo"), leaf(44, "bar")],
        }
    }

    fn parent_id(&self) -> Data {
        self.parent.as_ref().map(|p| p.id).into()
    }

    fn children_ids(&self) -> Data {
        Data::list(self.children.iter().map(|c| c.id))
    }
}

impl Serializable for Category {
    fn json_serialize(&self) -> Option<Data> {
        Some(Data::map([
            ("id", Data::from(self.id)),
            ("name", Data::from(self.name.as_str())),
        ]))
    }

    fn json_group_serialize(&self, groups: &[String]) -> Option<Data> {
        let mut entries = vec![
            ("id".to_string(), Data::from(self.id)),
            ("name".to_string(), Data::from(self.name.as_str())),
        ];
        if groups.iter().any(|g| g == "relationships") {
            entries.push(("parent".to_string(), self.parent_id()));
            entries.push(("children".to_string(), self.children_ids()));
        }
        Some(Data::Map(entries))
    }

    fn array_serialize(&self, groups: &[String]) -> Option<Data> {
        self.json_group_serialize(groups)
    }

    fn exposed_fields(&self) -> Option<Vec<ExposedField>> {
        Some(vec![
            ExposedField::new("id", self.id),
            ExposedField::new("name", self.name.as_str()),
            ExposedField::new("parent", self.parent_id()).in_groups(["relationships"]),
            ExposedField::new("children", self.children_ids()).in_groups(["relationships"]),
        ])
    }
}

#[derive(Debug, Deserialize)]
struct NewCategory {
    #[serde(default)]
    name: String,
}

async fn list_categories() -> Reply {
    Reply::new(Data::list([Data::object(Category::sample())]))
}

async fn show_category(Path(id): Path<i64>) -> Result<Reply, Fault> {
    if id != KNOWN_ID {
        return Err(ApiError::new(NOT_FOUND_CODE, "not found")
            .with_status(StatusCode::NOT_FOUND)
            .into());
    }
    Ok(Reply::new(Data::object(Category::sample())))
}

async fn create_category(Query(input): Query<NewCategory>) -> Result<Reply, Fault> {
    if input.name.trim().is_empty() {
        let errors = FormErrors::new()
            .with_child("name", FormErrors::new().with_error("This value should not be blank."));
        return Err(ApiError::invalid_form(errors).into());
    }

    Ok(Reply::created(Data::map([
        ("id", Data::from(KNOWN_ID + 1)),
        ("name", Data::from(input.name)),
    ])))
}

async fn boom() -> Result<Reply, Fault> {
    let value: u32 = "boom"
        .parse()
        .wrap_err("demo endpoint failed on purpose")?;
    Ok(Reply::new(value))
}

async fn private() -> Result<Reply, Fault> {
    Err(AuthenticationError::with_message("no credentials supplied").into())
}

async fn status() -> Data {
    Data::map([("status", "ok")])
}

/// Demo routes; `/status` opts in through its own action config.
pub fn router() -> Router {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/categories/{id}", get(show_category))
        .route("/api/boom", get(boom))
        .route("/api/private", get(private))
        .route(
            "/status",
            get(status).layer(middleware::from_fn(create_action_middleware(
                ActionConfig::new().serializer("json_encode"),
            ))),
        )
}
