// Node labels
pub const APPLICATION_LABEL: &str = "juju-application";
pub const CLOUD_LABEL: &str = "juju.io/cloud";

// Labels set on every pass regardless of the configured set
pub const IMPLICIT_LABELS: [&str; 2] = [APPLICATION_LABEL, CLOUD_LABEL];

// Persisted state entries
pub const CURRENT_LABELS_KEY: &str = "current_labels";
