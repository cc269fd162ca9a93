use nix::unistd::gethostname;
use tracing::debug;

use crate::errors::Error;

/// Name of the Node object this unit labels.
///
/// An explicit name wins; otherwise the lowercased host name is used, which is
/// what the kubelet registers by default.
pub fn resolve_node_name(explicit: Option<&str>) -> Result<String, Error> {
    if let Some(name) = explicit.map(str::trim).filter(|name| !name.is_empty()) {
        return Ok(name.to_string());
    }
    let hostname = gethostname()
        .map_err(|err| Error::NodeNameUnavailable(err.to_string()))?
        .into_string()
        .map_err(|raw| Error::NodeNameUnavailable(format!("host name {raw:?} is not UTF-8")))?;
    node_name_from_hostname(&hostname)
}

fn node_name_from_hostname(hostname: &str) -> Result<String, Error> {
    let name = hostname.trim().to_lowercase();
    if name.is_empty() {
        return Err(Error::NodeNameUnavailable(String::from("host name is empty")));
    }
    debug!("using host name {} as node name", name);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn explicit_name_wins() {
        assert_eq!(resolve_node_name(Some(" node-1 ")).unwrap(), "node-1");
    }

    #[test]
    fn host_name_is_lowercased() {
        assert_eq!(node_name_from_hostname("Worker-7\n").unwrap(), "worker-7");
    }

    #[test]
    fn empty_host_name_is_an_error() {
        assert_matches!(node_name_from_hostname(""), Err(Error::NodeNameUnavailable(_)));
    }

    #[test]
    fn falls_back_to_host_name() {
        let name = resolve_node_name(Some("")).unwrap();
        assert!(!name.is_empty());
        assert_eq!(name, name.to_lowercase());
    }
}
