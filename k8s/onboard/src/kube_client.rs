use crate::{
    common::{
        constants::HELM_RELEASE_OWNER_LABEL,
        error::{GetNamespace, K8sClientGeneration, Result},
    },
    resources::Resource,
};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::{
    api::{Api, DynamicObject, ListParams, Patch, PatchParams},
    discovery::{self, Scope},
    Client,
};
use serde_json::{json, Map, Value};
use snafu::ResultExt;
use std::fmt::{Display, Formatter};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Outcome of a single Kubernetes API call, with enough detail to tell an absent object apart
/// from a call that could not be answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiStatus {
    /// The call succeeded.
    Ok,
    /// The object, or its kind, does not exist.
    NotFound,
    /// The API server refused the caller's credentials or permissions.
    Denied(String),
    /// Any other failure, e.g. a network error or a 5xx. Nothing is known about the object.
    Unavailable(String),
}

impl ApiStatus {
    /// True if the call succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Collapses the result of a kube call into an ApiStatus.
    pub fn from_result<T>(result: std::result::Result<T, kube::Error>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(error) => error.into(),
        }
    }
}

impl From<kube::Error> for ApiStatus {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => match response.code {
                404 => Self::NotFound,
                401 | 403 => Self::Denied(response.message),
                _ => Self::Unavailable(response.message),
            },
            // The kind is not served by the cluster, so no object of that kind can exist.
            kube::Error::Discovery(_) => Self::NotFound,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl Display for ApiStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::NotFound => write!(f, "not found"),
            Self::Denied(reason) => write!(f, "access denied: {reason}"),
            Self::Unavailable(reason) => write!(f, "API unavailable: {reason}"),
        }
    }
}

/// Which part of an object's metadata an ownership mutation writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataField {
    Annotation,
    Label,
}

impl MetadataField {
    fn key(&self) -> &'static str {
        match self {
            Self::Annotation => "annotations",
            Self::Label => "labels",
        }
    }
}

/// The live cluster, as seen by the onboarding workflow.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Cluster {
    /// Validate that the release namespace exists and the API is reachable. All namespaced
    /// lookups and mutations target this namespace.
    async fn ensure_namespace(&self) -> Result<()>;

    /// GET the live object which matches the resource's kind and name.
    async fn probe(&self, resource: &Resource) -> ApiStatus;

    /// Set a single annotation or label on the live object.
    async fn set_metadata(
        &self,
        resource: &Resource,
        field: MetadataField,
        key: &str,
        value: &str,
    ) -> ApiStatus;
}

/// This is a builder for the KubeClientSet.
#[derive(Default)]
pub struct KubeClientSetBuilder {
    namespace: Option<String>,
}

impl KubeClientSetBuilder {
    /// This is a builder option to set the namespace the release lives in.
    #[must_use]
    pub fn with_namespace<J>(mut self, ns: J) -> Self
    where
        J: ToString,
    {
        self.namespace = Some(ns.to_string());
        self
    }

    /// Build the KubeClientSet from the default kubeconfig or in-cluster configuration.
    pub async fn build(self) -> Result<KubeClientSet> {
        let client = Client::try_default().await.context(K8sClientGeneration)?;
        let namespace = self
            .namespace
            .unwrap_or_else(|| client.default_namespace().to_string());

        Ok(KubeClientSet { client, namespace })
    }
}

/// Kubernetes clients bound to the release namespace.
#[derive(Clone)]
pub struct KubeClientSet {
    client: Client,
    namespace: String,
}

impl KubeClientSet {
    /// This creates an empty builder.
    pub fn builder() -> KubeClientSetBuilder {
        KubeClientSetBuilder::default()
    }

    /// Generate the Namespace api client.
    pub fn namespaces_api(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }

    /// Generate the Secret api client for the release namespace.
    pub fn secrets_api(&self) -> Api<Secret> {
        Api::namespaced(self.client.clone(), self.namespace.as_str())
    }

    /// Resolves the resource's apiVersion and kind against the cluster's discovery data and
    /// returns an api client scoped the way that kind is served.
    async fn dynamic_api(
        &self,
        resource: &Resource,
    ) -> std::result::Result<Api<DynamicObject>, kube::Error> {
        let gvk = resource.gvk();
        let (api_resource, capabilities) = discovery::pinned_kind(&self.client, &gvk).await?;

        Ok(match capabilities.scope {
            Scope::Cluster => Api::all_with(self.client.clone(), &api_resource),
            Scope::Namespaced => Api::namespaced_with(
                self.client.clone(),
                resource.namespace().unwrap_or(self.namespace.as_str()),
                &api_resource,
            ),
        })
    }
}

#[async_trait]
impl Cluster for KubeClientSet {
    async fn ensure_namespace(&self) -> Result<()> {
        self.namespaces_api()
            .get(self.namespace.as_str())
            .await
            .context(GetNamespace {
                namespace: self.namespace.clone(),
            })?;

        Ok(())
    }

    async fn probe(&self, resource: &Resource) -> ApiStatus {
        let result = match self.dynamic_api(resource).await {
            Ok(api) => api.get(resource.name()).await.map(|_| ()),
            Err(error) => Err(error),
        };
        ApiStatus::from_result(result)
    }

    async fn set_metadata(
        &self,
        resource: &Resource,
        field: MetadataField,
        key: &str,
        value: &str,
    ) -> ApiStatus {
        let api = match self.dynamic_api(resource).await {
            Ok(api) => api,
            Err(error) => return error.into(),
        };

        let patch = metadata_patch(field, key, value);
        debug!(%resource, %patch, "Merge patch");

        ApiStatus::from_result(
            api.patch(resource.name(), &PatchParams::default(), &Patch::Merge(&patch))
                .await,
        )
    }
}

/// Generates a JSON merge patch which sets a single annotation or label.
pub(crate) fn metadata_patch(field: MetadataField, key: &str, value: &str) -> Value {
    let mut entries = Map::new();
    entries.insert(key.to_string(), Value::String(value.to_string()));

    let mut metadata = Map::new();
    metadata.insert(field.key().to_string(), Value::Object(entries));

    json!({ "metadata": metadata })
}

/// Looks for helm v3 release Secrets of the named release in the client's namespace.
pub(crate) async fn release_secret_status(secrets: &Api<Secret>, release_name: &str) -> ApiStatus {
    let selector = format!("{HELM_RELEASE_OWNER_LABEL},name={release_name}");
    debug!(%selector, "Listing release Secrets");

    match secrets
        .list_metadata(&ListParams::default().labels(selector.as_str()).limit(1))
        .await
    {
        Ok(list) if list.items.is_empty() => ApiStatus::NotFound,
        Ok(_) => ApiStatus::Ok,
        Err(error) => error.into(),
    }
}
