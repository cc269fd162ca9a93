use clap::ValueEnum;
use serde::Deserialize;

/// Which cloud integration, if any, is ready for this deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CloudSignal {
    #[default]
    #[value(skip)]
    None,
    Aws,
    Gcp,
    #[value(name = "openstack")]
    OpenStack,
    #[value(name = "vsphere")]
    VSphere,
    Azure,
}

/// Order in which simultaneously ready integrations are considered.
pub const PRIORITY: [CloudSignal; 5] = [
    CloudSignal::Aws,
    CloudSignal::Gcp,
    CloudSignal::OpenStack,
    CloudSignal::VSphere,
    CloudSignal::Azure,
];

impl CloudSignal {
    /// Pick the first ready integration in priority order.
    pub fn from_ready(ready: &[CloudSignal]) -> CloudSignal {
        PRIORITY
            .iter()
            .copied()
            .find(|cloud| ready.contains(cloud))
            .unwrap_or(CloudSignal::None)
    }

    /// Value of the cloud label, or `None` when the label should be removed.
    pub fn label_value(self) -> Option<&'static str> {
        match self {
            CloudSignal::None => None,
            CloudSignal::Aws => Some("ec2"),
            CloudSignal::Gcp => Some("gce"),
            CloudSignal::OpenStack => Some("openstack"),
            CloudSignal::VSphere => Some("vsphere"),
            CloudSignal::Azure => Some("azure"),
        }
    }
}
