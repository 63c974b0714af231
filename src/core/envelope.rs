//! Wire shapes of the response body.
//!
//! ```json
//! {"data": <any>, "error": null}
//! {"data": null, "error": {"code": 12, "title": "not found", "errorData": null}}
//! ```
use std::collections::BTreeMap;

use crate::core::data::{Data, ExposedField, Serializable};

/// Error part of an envelope.
#[derive(Debug, Clone, Default)]
pub struct ErrorModel {
    pub code: i64,
    pub title: Option<String>,
    pub error_data: Option<Data>,
}

impl ErrorModel {
    pub fn new(code: i64, title: Option<String>, error_data: Option<Data>) -> Self {
        Self {
            code,
            title,
            error_data,
        }
    }

    fn fields(&self) -> Vec<(String, Data)> {
        vec![
            ("code".to_string(), Data::Int(self.code)),
            ("title".to_string(), self.title.clone().into()),
            (
                "errorData".to_string(),
                self.error_data.clone().unwrap_or_default(),
            ),
        ]
    }
}

impl Serializable for ErrorModel {
    fn json_serialize(&self) -> Option<Data> {
        Some(Data::Map(self.fields()))
    }

    fn json_group_serialize(&self, _groups: &[String]) -> Option<Data> {
        self.json_serialize()
    }

    fn array_serialize(&self, _groups: &[String]) -> Option<Data> {
        self.json_serialize()
    }

    fn exposed_fields(&self) -> Option<Vec<ExposedField>> {
        Some(exposed(self.fields()))
    }
}

/// The `{data, error}` wrapper; both keys are always present.
#[derive(Debug, Clone, Default)]
pub struct ResponseEnvelope {
    pub data: Option<Data>,
    pub error: Option<ErrorModel>,
}

impl ResponseEnvelope {
    pub fn success(data: Data) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failure(error: ErrorModel) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    fn fields(&self) -> Vec<(String, Data)> {
        vec![
            ("data".to_string(), self.data.clone().unwrap_or_default()),
            (
                "error".to_string(),
                self.error.clone().map(Data::object).unwrap_or_default(),
            ),
        ]
    }
}

impl Serializable for ResponseEnvelope {
    fn json_serialize(&self) -> Option<Data> {
        Some(Data::Map(self.fields()))
    }

    fn json_group_serialize(&self, _groups: &[String]) -> Option<Data> {
        self.json_serialize()
    }

    fn array_serialize(&self, _groups: &[String]) -> Option<Data> {
        self.json_serialize()
    }

    fn exposed_fields(&self) -> Option<Vec<ExposedField>> {
        Some(exposed(self.fields()))
    }
}

// Envelope keys sit in the default group, which the external adapter always requests.
fn exposed(fields: Vec<(String, Data)>) -> Vec<ExposedField> {
    fields
        .into_iter()
        .map(|(name, value)| ExposedField::new(name, value))
        .collect()
}

/// Validation messages of a submitted form, nested per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    pub errors: Vec<String>,
    pub children: BTreeMap<String, FormErrors>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    pub fn with_child(mut self, field: impl Into<String>, errors: FormErrors) -> Self {
        self.children.insert(field.into(), errors);
        self
    }

    /// True when neither this node nor any child holds a message.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.children.values().all(FormErrors::is_empty)
    }

    /// `{"errors": [..], "children": {..}}`; `children` is omitted when empty.
    pub fn to_data(&self) -> Data {
        let mut entries = vec![(
            "errors".to_string(),
            Data::list(self.errors.iter().map(String::as_str)),
        )];

        if !self.children.is_empty() {
            entries.push((
                "children".to_string(),
                Data::Map(
                    self.children
                        .iter()
                        .map(|(field, errors)| (field.clone(), errors.to_data()))
                        .collect(),
                ),
            ));
        }

        Data::Map(entries)
    }
}

impl From<FormErrors> for Data {
    fn from(errors: FormErrors) -> Self {
        errors.to_data()
    }
}
