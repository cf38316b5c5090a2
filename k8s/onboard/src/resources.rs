use crate::common::error::{MalformedDescriptor, Result, YamlParseFromSlice};
use kube::core::GroupVersionKind;
use serde::Deserialize;
use snafu::ResultExt;
use std::fmt::{Display, Formatter};

/// Existence checks of the expected resources against the live cluster.
pub mod existence;
/// Ownership annotations and labels for adopted resources.
pub mod patch;

/// The identifying part of a rendered manifest.
#[derive(Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
struct ObjectHeader {
    api_version: String,
    kind: String,
    metadata: ObjectHeaderMeta,
}

#[derive(Deserialize)]
struct ObjectHeaderMeta {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

/// A single Kubernetes object, as rendered by the chart. Only the kind and name (plus the
/// apiVersion and namespace needed to address it) are interpreted, the rest of the body is
/// carried as is.
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
    api_version: String,
    kind: String,
    name: String,
    namespace: Option<String>,
    body: serde_yaml::Value,
}

impl Resource {
    /// Builds a resource from one rendered document.
    fn from_document(index: usize, body: serde_yaml::Value) -> Result<Self> {
        let header: ObjectHeader =
            serde_yaml::from_value(body.clone()).context(MalformedDescriptor { index })?;

        Ok(Self {
            api_version: header.api_version,
            kind: header.kind,
            name: header.metadata.name,
            namespace: header.metadata.namespace,
            body,
        })
    }

    /// The kind of the object, e.g. Deployment.
    pub fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// The .metadata.name of the object.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The .metadata.namespace of the object, if the chart sets one.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The apiVersion of the object, e.g. apps/v1.
    pub fn api_version(&self) -> &str {
        self.api_version.as_str()
    }

    /// The full rendered document. Nothing in the workflow reads it; it is carried so that a
    /// descriptor always holds the whole object.
    pub fn body(&self) -> &serde_yaml::Value {
        &self.body
    }

    /// The GroupVersionKind used to look the kind up in the cluster's discovery data.
    pub fn gvk(&self) -> GroupVersionKind {
        let (group, version) = self
            .api_version
            .split_once('/')
            .unwrap_or(("", self.api_version.as_str()));
        GroupVersionKind::gvk(group, version, self.kind.as_str())
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Parses the multi-document output of `helm template`. Empty documents, such as the ones
/// which only carry a `# Source:` comment, are skipped.
pub fn parse_manifests(rendered: &[u8]) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_slice(rendered).enumerate() {
        let body = serde_yaml::Value::deserialize(document).context(YamlParseFromSlice { index })?;
        if body.is_null() {
            continue;
        }
        resources.push(Resource::from_document(index, body)?);
    }

    Ok(resources)
}
