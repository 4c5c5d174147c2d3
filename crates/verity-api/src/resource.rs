//! Generic CRUD adapter shared by every fabric resource.
//!
//! Every Verity resource follows one shape: `GET`, `PUT`, `PATCH` and
//! `DELETE` on a single collection path, bodies of the form
//! `{"<key>": {"<name>": <object>}}`, a `<resource>_name` query parameter
//! selecting objects and an optional `changeset_name` routing mutations into
//! a named changeset. A resource only declares those names.

use crate::Result;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::debug;
use verity_core::codec::classify_decode_error;
use verity_core::content::APPLICATION_JSON;
use verity_core::{
    parameter_add_to_header_or_query, report_error, ApiClient, ApiResponse, CallContext, Error,
    Operation, ParamValue, QueryParams, RequestBody, RequestParts, Style,
};

const JSON: &[&str] = &[APPLICATION_JSON];

/// Query parameter routing a call into a changeset.
pub const CHANGESET_PARAM: &str = "changeset_name";

/// Query parameter asking the server to include object data in listings.
pub const INCLUDE_DATA_PARAM: &str = "include_data";

/// Operation ids of a resource's four verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationIds {
    /// `GET`
    pub list: &'static str,
    /// `PUT`
    pub put: &'static str,
    /// `PATCH`
    pub patch: &'static str,
    /// `DELETE`
    pub delete: &'static str,
}

/// A fabric object type reachable through the generic CRUD adapter.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Collection path, e.g. `/tenants`
    const PATH: &'static str;
    /// Key wrapping the name map in bodies, e.g. `tenant`
    const BODY_KEY: &'static str;
    /// Query parameter naming objects, e.g. `tenant_name`
    const NAME_PARAM: &'static str;
    /// Operation ids used for per-operation server selection
    const OPERATIONS: OperationIds;
}

/// Implement [`Resource`] for a DTO.
macro_rules! declare_resource {
    (
        $ty:ty,
        service = $service:literal,
        path = $path:literal,
        key = $key:literal,
        name_param = $name_param:literal $(,)?
    ) => {
        impl $crate::resource::Resource for $ty {
            const PATH: &'static str = $path;
            const BODY_KEY: &'static str = $key;
            const NAME_PARAM: &'static str = $name_param;
            const OPERATIONS: $crate::resource::OperationIds = $crate::resource::OperationIds {
                list: concat!($service, "Get"),
                put: concat!($service, "Put"),
                patch: concat!($service, "Patch"),
                delete: concat!($service, "Delete"),
            };
        }
    };
}

pub(crate) use declare_resource;

/// Objects of one resource keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceMap<R> {
    items: BTreeMap<String, R>,
}

impl<R> Default for ResourceMap<R> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<R> ResourceMap<R> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, replacing any object of the same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, item: R) -> Self {
        self.items.insert(name.into(), item);
        self
    }

    /// Insert an object, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, item: R) -> Option<R> {
        self.items.insert(name.into(), item)
    }

    /// Look an object up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&R> {
        self.items.get(name)
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.items.iter().map(|(name, item)| (name.as_str(), item))
    }

    /// Object names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, R> {
        self.items
    }
}

impl<R: Resource> ResourceMap<R> {
    /// Extract the map under `R::BODY_KEY` from a decoded response.
    ///
    /// A missing or `null` key yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns a decoding-kind error when the payload is not an object or an
    /// entry does not match `R`.
    pub fn from_response(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(mut top) = value else {
            return Err(Error::Decoding(format!(
                "expected an object wrapping `{}`",
                R::BODY_KEY
            )));
        };
        match top.remove(R::BODY_KEY) {
            None | Some(serde_json::Value::Null) => Ok(Self::new()),
            Some(inner) => serde_json::from_value(inner)
                .map(|items| Self { items })
                .map_err(|err| classify_decode_error(&err)),
        }
    }

    /// The `{"<key>": {...}}` request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if an object cannot be serialized.
    pub fn to_body(&self) -> Result<RequestBody> {
        let wrapped: BTreeMap<&str, &BTreeMap<String, R>> =
            BTreeMap::from([(R::BODY_KEY, &self.items)]);
        RequestBody::json(&wrapped)
    }
}

impl<R> FromIterator<(String, R)> for ResourceMap<R> {
    fn from_iter<I: IntoIterator<Item = (String, R)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<R> IntoIterator for ResourceMap<R> {
    type Item = (String, R);
    type IntoIter = std::collections::btree_map::IntoIter<String, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

fn push_changeset(query: &mut QueryParams, changeset: Option<String>) -> Result<()> {
    parameter_add_to_header_or_query(
        query,
        CHANGESET_PARAM,
        &ParamValue::from(changeset),
        Style::Form,
        true,
    )
}

/// Handle on one resource collection.
pub struct ResourceService<'a, R> {
    client: &'a ApiClient,
    marker: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceService<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ResourceService<'_, R> {}

impl<R> std::fmt::Debug for ResourceService<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("resource", &std::any::type_name::<R>())
            .finish_non_exhaustive()
    }
}

impl<'a, R: Resource> ResourceService<'a, R> {
    /// Create a handle over a client.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            marker: PhantomData,
        }
    }

    /// Start a `GET` on the collection.
    pub fn list(&self) -> GetRequest<'a, R> {
        GetRequest {
            client: self.client,
            ctx: CallContext::new(),
            name: None,
            include_data: None,
            changeset_name: None,
            marker: PhantomData,
        }
    }

    /// Start a `PUT` creating or replacing objects.
    pub fn put(&self) -> PutRequest<'a, R> {
        WriteRequest::new(self.client, Method::PUT, R::OPERATIONS.put)
    }

    /// Start a `PATCH` updating objects.
    ///
    /// Fields left absent are not sent; explicit nulls are.
    pub fn patch(&self) -> PatchRequest<'a, R> {
        WriteRequest::new(self.client, Method::PATCH, R::OPERATIONS.patch)
    }

    /// Start a `DELETE` of named objects.
    pub fn delete(&self) -> DeleteRequest<'a, R> {
        DeleteRequest {
            client: self.client,
            ctx: CallContext::new(),
            names: Vec::new(),
            changeset_name: None,
            marker: PhantomData,
        }
    }
}

/// `GET <path>` with optional name, `include_data` and changeset filters.
#[must_use = "requests do nothing until executed"]
pub struct GetRequest<'a, R> {
    client: &'a ApiClient,
    ctx: CallContext,
    name: Option<String>,
    include_data: Option<bool>,
    changeset_name: Option<String>,
    marker: PhantomData<fn() -> R>,
}

impl<R: Resource> GetRequest<'_, R> {
    /// Use a call context.
    pub fn with_context(mut self, ctx: CallContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Only return the named object.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Ask for object data, not only names.
    pub fn with_include_data(mut self, include_data: bool) -> Self {
        self.include_data = Some(include_data);
        self
    }

    /// Read from a changeset.
    pub fn with_changeset(mut self, changeset: impl Into<String>) -> Self {
        self.changeset_name = Some(changeset.into());
        self
    }

    /// Send the request and decode the returned objects.
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, cancellation or decoding errors.
    pub async fn execute(self) -> Result<(ResourceMap<R>, ApiResponse)> {
        let mut query = QueryParams::new();
        parameter_add_to_header_or_query(
            &mut query,
            R::NAME_PARAM,
            &ParamValue::from(self.name),
            Style::Form,
            true,
        )?;
        parameter_add_to_header_or_query(
            &mut query,
            INCLUDE_DATA_PARAM,
            &ParamValue::from(self.include_data),
            Style::Form,
            true,
        )?;
        push_changeset(&mut query, self.changeset_name)?;

        let operation =
            Operation::new(R::OPERATIONS.list, Method::GET, R::PATH).with_produces(JSON);
        let response = self
            .client
            .execute(&self.ctx, &operation, RequestParts::new().with_query(query))
            .await?;

        if response.body().is_empty() {
            return Ok((ResourceMap::new(), response));
        }
        let value = self.client.decode(&response)?;
        let items = ResourceMap::from_response(value)?;
        debug!(resource = R::BODY_KEY, count = items.len(), "Listed objects");
        Ok((items, response))
    }
}

/// `PUT` or `PATCH` of a name-keyed object map.
#[must_use = "requests do nothing until executed"]
pub struct WriteRequest<'a, R> {
    client: &'a ApiClient,
    ctx: CallContext,
    method: Method,
    operation_id: &'static str,
    items: Option<ResourceMap<R>>,
    changeset_name: Option<String>,
}

/// `PUT <path>`.
pub type PutRequest<'a, R> = WriteRequest<'a, R>;

/// `PATCH <path>`.
pub type PatchRequest<'a, R> = WriteRequest<'a, R>;

impl<'a, R: Resource> WriteRequest<'a, R> {
    fn new(client: &'a ApiClient, method: Method, operation_id: &'static str) -> Self {
        Self {
            client,
            ctx: CallContext::new(),
            method,
            operation_id,
            items: None,
            changeset_name: None,
        }
    }

    /// Use a call context.
    pub fn with_context(mut self, ctx: CallContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Set the whole body.
    pub fn with_items(mut self, items: ResourceMap<R>) -> Self {
        self.items = Some(items);
        self
    }

    /// Add one object to the body.
    pub fn with_item(mut self, name: impl Into<String>, item: R) -> Self {
        self.items
            .get_or_insert_with(ResourceMap::new)
            .insert(name, item);
        self
    }

    /// Stage the change in a changeset.
    pub fn with_changeset(mut self, changeset: impl Into<String>) -> Self {
        self.changeset_name = Some(changeset.into());
        self
    }

    /// Send the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no body was given, otherwise
    /// transport, HTTP or cancellation errors.
    pub async fn execute(self) -> Result<ApiResponse> {
        let items = self.items.ok_or_else(|| {
            report_error(format!(
                "{} body is required and must be specified",
                R::BODY_KEY
            ))
        })?;

        let mut query = QueryParams::new();
        push_changeset(&mut query, self.changeset_name)?;

        let operation = Operation::new(self.operation_id, self.method, R::PATH)
            .with_consumes(JSON)
            .with_produces(JSON);
        let parts = RequestParts::new()
            .with_query(query)
            .with_body(items.to_body()?);
        self.client.execute(&self.ctx, &operation, parts).await
    }
}

/// `DELETE <path>?<name_param>=a&<name_param>=b`.
#[must_use = "requests do nothing until executed"]
pub struct DeleteRequest<'a, R> {
    client: &'a ApiClient,
    ctx: CallContext,
    names: Vec<String>,
    changeset_name: Option<String>,
    marker: PhantomData<fn() -> R>,
}

impl<R: Resource> DeleteRequest<'_, R> {
    /// Use a call context.
    pub fn with_context(mut self, ctx: CallContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Add the names of objects to delete.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add one object name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Stage the deletion in a changeset.
    pub fn with_changeset(mut self, changeset: impl Into<String>) -> Self {
        self.changeset_name = Some(changeset.into());
        self
    }

    /// Send the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no name was given, otherwise
    /// transport, HTTP or cancellation errors.
    pub async fn execute(self) -> Result<ApiResponse> {
        if self.names.is_empty() {
            return Err(report_error(format!(
                "{} is required and must be specified",
                R::NAME_PARAM
            )));
        }

        let mut query = QueryParams::new();
        parameter_add_to_header_or_query(
            &mut query,
            R::NAME_PARAM,
            &ParamValue::from(self.names),
            Style::Multi,
            true,
        )?;
        push_changeset(&mut query, self.changeset_name)?;

        let operation = Operation::new(R::OPERATIONS.delete, Method::DELETE, R::PATH);
        self.client
            .execute(&self.ctx, &operation, RequestParts::new().with_query(query))
            .await
    }
}
