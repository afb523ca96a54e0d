use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BucketNameError;

pub const BUCKET_PREFIX_PROPERTY: &str = "bucket_prefix";
pub const BUCKET_NAME_FIELD: &str = "bucket_name";
pub const MISSING_PREFIX_MESSAGE: &str = "Must provide a bucket_prefix value in properties";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// A CloudFormation custom-resource request.
///
/// Only `request_type` and `resource_properties` drive behavior; the rest is
/// carried through untouched so the response can be addressed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
    #[serde(default)]
    pub resource_properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Map<String, Value>>,
}

impl LifecycleEvent {
    /// Bare event with no transport metadata. Mostly useful in tests.
    pub fn new(request_type: RequestType, resource_properties: Map<String, Value>) -> Self {
        Self {
            request_type,
            response_url: String::new(),
            stack_id: String::new(),
            request_id: String::new(),
            resource_type: String::new(),
            logical_resource_id: String::new(),
            physical_resource_id: None,
            service_token: None,
            resource_properties,
            old_resource_properties: None,
        }
    }

    /// Reads `bucket_prefix`, rejecting missing, null, empty and non-string values.
    pub fn bucket_prefix(&self) -> Result<&str, BucketNameError> {
        match self.resource_properties.get(BUCKET_PREFIX_PROPERTY) {
            None | Some(Value::Null) => Err(BucketNameError::validation(MISSING_PREFIX_MESSAGE)),
            Some(Value::String(prefix)) if prefix.is_empty() => {
                Err(BucketNameError::validation(MISSING_PREFIX_MESSAGE))
            }
            Some(Value::String(prefix)) => Ok(prefix),
            Some(_) => Err(BucketNameError::validation(
                "bucket_prefix must be a string",
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ResponseData(BTreeMap<String, String>);

impl ResponseData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn bucket_name(&self) -> Option<&str> {
        self.get(BUCKET_NAME_FIELD)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
