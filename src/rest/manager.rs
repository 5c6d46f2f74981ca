//! Generic resource managers and lazy list pagination.
//!
//! A [`ResourceManager`] knows where a resource type lives inside one bound
//! service (optionally beneath a parent instance) and turns the resource's
//! static options into HTTP requests:
//!
//! | operation          | request                                   |
//! |--------------------|-------------------------------------------|
//! | `all()`            | `GET <endpoint>[/detail]`, paginated      |
//! | `get(key)`         | `GET <endpoint>/<key>`                    |
//! | `create(params)`   | `POST <endpoint>`                         |
//! | `update(key, ..)`  | `PUT` or `PATCH <endpoint>/<key>`         |
//! | `delete(key)`      | `DELETE <endpoint>/<key>`                 |
//! | `action(key, ..)`  | `POST <endpoint>/<key>/<action>`          |
//!
//! Endpoints declared with a trailing slash keep one on every URL.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::clients::{HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse};
use crate::rest::{
    service_name, Embedded, Resource, ResourceError, Service, ServiceResolver,
    UnmanagedEndpoint, UnmanagedResource,
};

/// Values usable as an instance key: plain strings or resources themselves.
pub trait IntoKey {
    /// Returns the key used in instance URLs.
    fn into_key(self) -> String;
}

impl IntoKey for &str {
    fn into_key(self) -> String {
        self.to_string()
    }
}

impl IntoKey for String {
    fn into_key(self) -> String {
        self
    }
}

impl<R: Resource> IntoKey for &R {
    fn into_key(self) -> String {
        self.primary_key()
    }
}

/// Manager for one resource type within one service.
///
/// Managers are cheap to create and clone; they hold the bound service and
/// the resolver used for relations.
pub struct ResourceManager<R> {
    service: Arc<Service>,
    resolver: Arc<dyn ServiceResolver>,
    parent_path: String,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceManager<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            resolver: Arc::clone(&self.resolver),
            parent_path: self.parent_path.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for ResourceManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("service", &self.service.name())
            .field("parent_path", &self.parent_path)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceManager<R> {
    /// Creates a root manager.
    #[must_use]
    pub fn new(service: Arc<Service>, resolver: Arc<dyn ServiceResolver>) -> Self {
        Self::nested_under(service, resolver, String::new())
    }

    fn nested_under(
        service: Arc<Service>,
        resolver: Arc<dyn ServiceResolver>,
        parent_path: String,
    ) -> Self {
        Self {
            service,
            resolver,
            parent_path,
            _resource: PhantomData,
        }
    }

    /// Returns the bound service.
    #[must_use]
    pub const fn service(&self) -> &Arc<Service> {
        &self.service
    }

    /// Returns the resolver used for relations.
    #[must_use]
    pub const fn resolver(&self) -> &Arc<dyn ServiceResolver> {
        &self.resolver
    }

    fn path(&self, segments: &[&str]) -> String {
        let mut path = format!(
            "{}{}",
            self.parent_path,
            R::OPTIONS.endpoint().trim_end_matches('/')
        );
        for segment in segments {
            path.push('/');
            path.push_str(&urlencoding::encode(segment));
        }
        path
    }

    /// Builds the absolute URL for the collection or for a path below it.
    ///
    /// Segments are percent-encoded.
    #[must_use]
    pub fn prepare_url(&self, segments: &[&str]) -> String {
        let mut url = format!("{}{}", self.service.api_url(), self.path(segments));
        if R::OPTIONS.endpoint().ends_with('/') {
            url.push('/');
        }
        url
    }

    /// Lists every entity, following pagination lazily.
    ///
    /// Resources declared with a detail view are listed from
    /// `<endpoint>/detail`.
    #[must_use]
    pub fn all(&self) -> ResourceList<R> {
        self.list(self.listing_url(), None)
    }

    /// Lists every entity, filtering the first request with query parameters.
    #[must_use]
    pub fn all_with<I, K, V>(&self, query: I) -> ResourceList<R>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.list(self.listing_url(), Some(collect_query(query)))
    }

    /// Lists summary entities from the plain collection endpoint.
    ///
    /// For resources without a detail view this is the same as [`all`](Self::all).
    #[must_use]
    pub fn summary(&self) -> ResourceList<R> {
        self.list(self.prepare_url(&[]), None)
    }

    /// Lists summary entities, filtering the first request with query parameters.
    #[must_use]
    pub fn summary_with<I, K, V>(&self, query: I) -> ResourceList<R>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.list(self.prepare_url(&[]), Some(collect_query(query)))
    }

    fn listing_url(&self) -> String {
        if R::OPTIONS.has_detail() {
            self.prepare_url(&["detail"])
        } else {
            self.prepare_url(&[])
        }
    }

    fn list(&self, url: String, query: Option<HashMap<String, String>>) -> ResourceList<R> {
        ResourceList {
            service: Arc::clone(&self.service),
            next_url: Some(url),
            query,
            buffer: VecDeque::new(),
            pages: 0,
            _resource: PhantomData,
        }
    }

    /// Fetches one entity.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] for API failures (including 404) and
    /// [`ResourceError::MalformedEnvelope`] if the entity is not wrapped as
    /// declared.
    pub async fn get(&self, key: impl IntoKey) -> Result<R, ResourceError> {
        let key = key.into_key();
        let url = self.prepare_url(&[key.as_str()]);
        let response = self.send(HttpRequest::builder(HttpMethod::Get, url)).await?;
        self.make_instance(response.body)
    }

    /// Creates an entity from attribute-named parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidParams`] if `params` does not serialize
    /// to an object, otherwise as [`get`](Self::get).
    pub async fn create<P: Serialize + ?Sized>(&self, params: &P) -> Result<R, ResourceError> {
        let body = self.prepare_params(params)?;
        let request = HttpRequest::builder(HttpMethod::Post, self.prepare_url(&[])).json(body);
        let response = self.send(request).await?;
        self.make_instance(response.body)
    }

    /// Updates an entity with the resource's declared update verb.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create).
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        key: impl IntoKey,
        params: &P,
    ) -> Result<R, ResourceError> {
        let body = self.prepare_params(params)?;
        let key = key.into_key();
        let url = self.prepare_url(&[key.as_str()]);
        let request = HttpRequest::builder(R::OPTIONS.update_verb(), url).json(body);
        let response = self.send(request).await?;
        self.make_instance(response.body)
    }

    /// Deletes an entity.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] for API failures.
    pub async fn delete(&self, key: impl IntoKey) -> Result<(), ResourceError> {
        let key = key.into_key();
        let url = self.prepare_url(&[key.as_str()]);
        self.send(HttpRequest::builder(HttpMethod::Delete, url))
            .await
            .map(|_| ())
    }

    /// Posts a custom action to an instance and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] for API failures.
    pub async fn action(
        &self,
        key: impl IntoKey,
        action: &str,
        body: Value,
    ) -> Result<HttpResponse, ResourceError> {
        let key = key.into_key();
        let url = self.prepare_url(&[key.as_str(), action]);
        tracing::debug!(resource = R::NAME, action, "invoking resource action");
        self.send(HttpRequest::builder(HttpMethod::Post, url).json(body))
            .await
    }

    /// Posts a custom action and decodes the response as another resource.
    ///
    /// # Errors
    ///
    /// As [`action`](Self::action), plus envelope and decode failures for `T`.
    pub async fn action_one<T: Resource>(
        &self,
        key: impl IntoKey,
        action: &str,
        body: Value,
    ) -> Result<T, ResourceError> {
        let response = self.action(key, action, body).await?;
        T::from_wire(extract_one::<T>(response.body)?)
    }

    /// Returns the manager for a child collection under one instance.
    #[must_use]
    pub fn nested<C: Resource>(&self, key: impl IntoKey) -> ResourceManager<C> {
        let key = key.into_key();
        ResourceManager::nested_under(
            Arc::clone(&self.service),
            Arc::clone(&self.resolver),
            self.path(&[key.as_str()]),
        )
    }

    /// Returns an unmanaged endpoint under one instance.
    #[must_use]
    pub fn nested_endpoint<U: UnmanagedResource>(&self, key: impl IntoKey) -> UnmanagedEndpoint<U> {
        let key = key.into_key();
        UnmanagedEndpoint::new(Arc::clone(&self.service), self.path(&[key.as_str()]))
    }

    /// Returns the root manager for a related resource, possibly in another service.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::RelationResolution`] if no suitable service is
    /// available.
    pub fn related<T: Resource>(&self) -> Result<ResourceManager<T>, ResourceError> {
        related_manager(&self.resolver)
    }

    /// Fetches the full entity behind an embedded reference.
    ///
    /// # Errors
    ///
    /// As [`Embedded::fetch`].
    pub async fn fetch_embedded<T: Resource>(
        &self,
        embedded: &Embedded<T>,
    ) -> Result<T, ResourceError> {
        embedded.fetch(&self.resolver).await
    }

    /// Translates attribute names to wire names and applies the envelope key.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidParams`] if `params` is not an object.
    pub fn prepare_params<P: Serialize + ?Sized>(&self, params: &P) -> Result<Value, ResourceError> {
        let invalid = |message: String| ResourceError::InvalidParams {
            resource: R::NAME,
            message,
        };
        let attributes = match serde_json::to_value(params) {
            Ok(Value::Object(attributes)) => attributes,
            Ok(other) => return Err(invalid(format!("expected an object, found {other}"))),
            Err(e) => return Err(invalid(e.to_string())),
        };

        let wire = Value::Object(R::FIELDS.to_wire(attributes));
        Ok(match R::OPTIONS.resource_key() {
            Some(key) => {
                let mut envelope = Map::new();
                envelope.insert(key, wire);
                Value::Object(envelope)
            }
            None => wire,
        })
    }

    fn make_instance(&self, body: Value) -> Result<R, ResourceError> {
        R::from_wire(extract_one::<R>(body)?)
    }

    async fn send(&self, builder: HttpRequestBuilder) -> Result<HttpResponse, ResourceError> {
        let request = builder.build().map_err(HttpError::from)?;
        Ok(self.service.client().request(request).await?)
    }
}

/// Resolves the root manager for `T` through the service that owns it.
///
/// The accessor name is derived from `T::CATALOG_TYPE`; the resolved
/// service must have the same catalog type.
///
/// # Errors
///
/// Returns [`ResourceError::RelationResolution`] on any failure. These are
/// configuration defects and are logged at error level.
pub fn related_manager<T: Resource>(
    resolver: &Arc<dyn ServiceResolver>,
) -> Result<ResourceManager<T>, ResourceError> {
    let name = service_name(T::CATALOG_TYPE);
    let fail = |reason: String| {
        tracing::error!(resource = T::NAME, service = %name, %reason, "unable to locate manager for related resource");
        ResourceError::RelationResolution {
            resource: T::NAME,
            service: name.clone(),
            reason,
        }
    };

    let service = resolver.resolve(&name).map_err(|e| fail(e.to_string()))?;
    if service.catalog_type() != T::CATALOG_TYPE {
        return Err(fail(format!(
            "service has catalog type '{}', expected '{}'",
            service.catalog_type(),
            T::CATALOG_TYPE
        )));
    }
    Ok(ResourceManager::new(service, Arc::clone(resolver)))
}

/// Unwraps a single entity from its envelope.
///
/// # Errors
///
/// Returns [`ResourceError::MalformedEnvelope`] if the declared key is missing.
pub fn extract_one<R: Resource>(body: Value) -> Result<Value, ResourceError> {
    match R::OPTIONS.resource_key() {
        Some(key) => match body {
            Value::Object(mut envelope) => envelope
                .remove(&key)
                .ok_or_else(|| ResourceError::envelope(R::NAME, key)),
            _ => Err(ResourceError::envelope(R::NAME, key)),
        },
        None => Ok(body),
    }
}

/// Splits one list page into its entities and the next-page URL.
///
/// The next URL is the `href` of the first `rel == "next"` entry under the
/// links key, falling back to a string `next` field in the envelope.
///
/// # Errors
///
/// Returns [`ResourceError::MalformedEnvelope`] if the list key is missing
/// or not an array.
pub fn extract_list<R: Resource>(body: Value) -> Result<(Vec<Value>, Option<String>), ResourceError> {
    let list_key = R::OPTIONS.list_key();
    let Value::Object(mut envelope) = body else {
        return Err(ResourceError::envelope(R::NAME, list_key));
    };
    let items = match envelope.remove(list_key) {
        Some(Value::Array(items)) => items,
        _ => return Err(ResourceError::envelope(R::NAME, list_key)),
    };

    let next = envelope
        .get(&R::OPTIONS.links_key())
        .and_then(Value::as_array)
        .and_then(|links| {
            links
                .iter()
                .find(|link| link.get("rel").and_then(Value::as_str) == Some("next"))
        })
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
        .or_else(|| envelope.get("next").and_then(Value::as_str))
        .map(String::from);

    Ok((items, next))
}

fn collect_query<I, K, V>(query: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    query
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A lazy, single-pass sequence over every entity of a listing.
///
/// Pages are requested one at a time: the next page is fetched only when
/// the entities of the current one have all been yielded. Calling
/// [`ResourceManager::all`] again starts over from the first page.
///
/// # Example
///
/// ```rust,ignore
/// let mut servers = compute.servers().all();
/// while let Some(server) = servers.next().await? {
///     println!("{}", server.name);
/// }
/// ```
pub struct ResourceList<R> {
    service: Arc<Service>,
    next_url: Option<String>,
    query: Option<HashMap<String, String>>,
    buffer: VecDeque<Value>,
    pages: usize,
    _resource: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for ResourceList<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceList")
            .field("next_url", &self.next_url)
            .field("buffered", &self.buffer.len())
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceList<R> {
    /// Returns the next entity, fetching the next page if needed.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; the sequence should not be
    /// polled again after an error.
    pub async fn next(&mut self) -> Result<Option<R>, ResourceError> {
        loop {
            if let Some(entity) = self.buffer.pop_front() {
                return R::from_wire(entity).map(Some);
            }
            let Some(url) = self.next_url.take() else {
                return Ok(None);
            };
            self.fetch_page(url).await?;
        }
    }

    /// Drains the sequence into a vector.
    ///
    /// # Errors
    ///
    /// As [`next`](Self::next).
    pub async fn try_collect(mut self) -> Result<Vec<R>, ResourceError> {
        let mut entities = Vec::new();
        while let Some(entity) = self.next().await? {
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Returns how many pages have been fetched so far.
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.pages
    }

    async fn fetch_page(&mut self, url: String) -> Result<(), ResourceError> {
        let mut builder = HttpRequest::builder(HttpMethod::Get, url.clone());
        if let Some(query) = self.query.take() {
            builder = builder.query(query);
        }
        let request = builder.build().map_err(HttpError::from)?;
        let response = self.service.client().request(request).await?;
        self.pages += 1;

        let (items, next) = extract_list::<R>(response.body)?;
        tracing::debug!(
            resource = R::NAME,
            page = self.pages,
            entities = items.len(),
            has_next = next.is_some(),
            "fetched list page"
        );

        self.next_url = next
            .map(|href| resolve_href::<R>(&url, &href))
            .transpose()?;
        self.buffer.extend(items);
        Ok(())
    }
}

/// Resolves a possibly relative next-page reference against the current page.
fn resolve_href<R: Resource>(base: &str, href: &str) -> Result<String, ResourceError> {
    reqwest::Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .map_err(|_| ResourceError::envelope(R::NAME, "next"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ClientSettings, HttpClient, TokenAuth};
    use crate::rest::{Entity, FieldMap, ResourceOptions};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Clone, Debug, Deserialize)]
    struct Widget {
        id: String,
        #[serde(default)]
        colour: Option<String>,
    }

    impl Entity for Widget {
        const NAME: &'static str = "Widget";
        const FIELDS: FieldMap = FieldMap::new(&[("colour", "widgetColour")], &[]);
    }

    impl Resource for Widget {
        const CATALOG_TYPE: &'static str = "widgets";
        const OPTIONS: ResourceOptions = ResourceOptions::new("/widgets").with_detail();

        fn primary_key(&self) -> String {
            self.id.clone()
        }
    }

    #[derive(Clone, Debug, Deserialize)]
    struct Part {
        id: u64,
    }

    impl Entity for Part {
        const NAME: &'static str = "Part";
    }

    impl Resource for Part {
        const CATALOG_TYPE: &'static str = "widgets";
        const OPTIONS: ResourceOptions = ResourceOptions::new("/parts/").unwrapped();

        fn primary_key(&self) -> String {
            self.id.to_string()
        }
    }

    struct NoServices;

    impl ServiceResolver for NoServices {
        fn resolve(&self, name: &str) -> Result<Arc<Service>, ResourceError> {
            Err(ResourceError::UnknownService {
                name: name.to_string(),
            })
        }
    }

    fn manager<R: Resource>() -> ResourceManager<R> {
        let client =
            Arc::new(HttpClient::new(&ClientSettings::default(), Arc::new(TokenAuth::new())).unwrap());
        let service = Service::new("widgets", "widgets", "http://api.local:9000", "/v1", client);
        ResourceManager::new(Arc::new(service), Arc::new(NoServices))
    }

    #[test]
    fn test_prepare_url_joins_prefix_endpoint_and_key() {
        let widgets = manager::<Widget>();
        assert_eq!(widgets.prepare_url(&[]), "http://api.local:9000/v1/widgets");
        assert_eq!(
            widgets.prepare_url(&["w 1", "action"]),
            "http://api.local:9000/v1/widgets/w%201/action"
        );
    }

    #[test]
    fn test_trailing_slash_endpoints_keep_trailing_slash() {
        let parts = manager::<Part>();
        assert_eq!(parts.prepare_url(&[]), "http://api.local:9000/v1/parts/");
        assert_eq!(parts.prepare_url(&["7", "copy"]), "http://api.local:9000/v1/parts/7/copy/");
    }

    #[test]
    fn test_nested_manager_prefixes_parent_instance() {
        let parts = manager::<Widget>().nested::<Part>("w1");
        assert_eq!(parts.prepare_url(&[]), "http://api.local:9000/v1/widgets/w1/parts/");
        assert_eq!(parts.prepare_url(&["3"]), "http://api.local:9000/v1/widgets/w1/parts/3/");
    }

    #[test]
    fn test_prepare_params_aliases_and_nests() {
        let body = manager::<Widget>()
            .prepare_params(&json!({"colour": "red", "name": "gear"}))
            .unwrap();
        assert_eq!(body, json!({"widget": {"widgetColour": "red", "name": "gear"}}));

        let body = manager::<Part>().prepare_params(&json!({"name": "bolt"})).unwrap();
        assert_eq!(body, json!({"name": "bolt"}));
    }

    #[test]
    fn test_prepare_params_rejects_non_objects() {
        let error = manager::<Widget>().prepare_params(&json!(["a"])).unwrap_err();
        assert!(matches!(error, ResourceError::InvalidParams { resource: "Widget", .. }));
    }

    #[test]
    fn test_extract_one_honours_resource_key() {
        let entity = extract_one::<Widget>(json!({"widget": {"id": "w1"}})).unwrap();
        assert_eq!(entity, json!({"id": "w1"}));

        let error = extract_one::<Widget>(json!({"id": "w1"})).unwrap_err();
        assert!(matches!(error, ResourceError::MalformedEnvelope { .. }));

        let entity = extract_one::<Part>(json!({"id": 3})).unwrap();
        assert_eq!(entity, json!({"id": 3}));
    }

    #[test]
    fn test_extract_list_reads_links_then_next_field() {
        let (items, next) = extract_list::<Widget>(json!({
            "widgets": [{"id": "a"}, {"id": "b"}],
            "widgets_links": [
                {"rel": "self", "href": "http://x/self"},
                {"rel": "next", "href": "http://x/page2"}
            ]
        }))
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(next.as_deref(), Some("http://x/page2"));

        let (_, next) = extract_list::<Widget>(json!({"widgets": [], "next": "/v1/widgets?marker=b"})).unwrap();
        assert_eq!(next.as_deref(), Some("/v1/widgets?marker=b"));

        let (_, next) = extract_list::<Widget>(json!({"widgets": [], "next": null})).unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn test_extract_list_requires_array_under_list_key() {
        let error = extract_list::<Widget>(json!({"items": []})).unwrap_err();
        assert!(matches!(
            error,
            ResourceError::MalformedEnvelope { resource: "Widget", ref key } if key == "widgets"
        ));
        assert!(extract_list::<Widget>(json!({"widgets": {}})).is_err());
    }

    #[test]
    fn test_resolve_href_handles_relative_references() {
        let url = resolve_href::<Widget>("http://api.local:9000/v1/widgets?page=1", "/v1/widgets?page=2")
            .unwrap();
        assert_eq!(url, "http://api.local:9000/v1/widgets?page=2");

        let url = resolve_href::<Widget>("http://a/v1/widgets", "http://b/other").unwrap();
        assert_eq!(url, "http://b/other");
    }

    #[test]
    fn test_related_reports_fatal_resolution_error() {
        let error = manager::<Widget>().related::<Part>().unwrap_err();
        assert!(error.is_fatal());
        assert!(matches!(
            error,
            ResourceError::RelationResolution { resource: "Part", ref service, .. } if service == "widgets"
        ));
    }

    #[test]
    fn test_into_key_accepts_resources() {
        let widget = Widget {
            id: "w9".to_string(),
            colour: None,
        };
        assert_eq!((&widget).into_key(), "w9");
        assert_eq!("raw".into_key(), "raw");
        assert!(widget.colour.is_none());
    }
}
