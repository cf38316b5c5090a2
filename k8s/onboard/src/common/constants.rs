/// This is the name of the package manager that takes over the resources.
pub const PRODUCT: &str = "Helm";

/// This is the helm binary, resolved from $PATH.
pub const HELM: &str = "helm";

/// The only supported major version of helm. Output of `helm version --short` must match this.
pub const HELM_V3_REGEX: &str = r"^v3\.[0-9]+\.[0-9]+";

/// Annotation which tells helm which release owns an object.
pub const RELEASE_NAME_ANNOTATION_KEY: &str = "meta.helm.sh/release-name";

/// Annotation which tells helm the namespace of the release that owns an object.
pub const RELEASE_NAMESPACE_ANNOTATION_KEY: &str = "meta.helm.sh/release-namespace";

/// Label which marks an object as managed by helm.
pub const MANAGED_BY_LABEL_KEY: &str = "app.kubernetes.io/managed-by";

/// Value of the managed-by label which helm expects on objects it adopts.
pub const MANAGED_BY_LABEL_VALUE: &str = "Helm";

/// Name of the scaffolded chart which is installed as the placeholder release.
pub const EMPTY_CHART_NAME: &str = "empty";

/// Directory, within a chart, which holds the resource templates.
pub const CHART_TEMPLATES_DIR: &str = "templates";

/// Label selector shared by all helm v3 release Secrets.
pub const HELM_RELEASE_OWNER_LABEL: &str = "owner=helm";

/// Prompt shown when some of the expected resources are not live.
pub const CONTINUE_PROMPT: &str = "Do you want to continue? [y/N]";

/// The only answer to the prompt which lets the workflow proceed.
pub const CONTINUE_ANSWER: &str = "y";
