//! JSON view models returned by the admin routes.

use crate::model::{DatabaseEntry, FormGroup};
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of a create, edit or delete submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPost {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EditPost {
    pub fn ok() -> Self {
        EditPost {
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        EditPost {
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// One page of list rows in the shape DataTables expects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTableResponse {
    pub draw: u64,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct ResourceIndex {
    pub resources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ListView {
    pub resource: String,
    pub headers: Vec<String>,
    pub primary_keys: Vec<String>,
    pub per_page: u32,
}

/// Data for a create or edit form. `object` is empty when creating.
#[derive(Debug, Serialize)]
pub struct EditView {
    pub resource: String,
    pub create: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,
    pub object: DatabaseEntry,
    pub form: Vec<FormGroup>,
}
