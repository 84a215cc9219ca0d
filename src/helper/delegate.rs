//! Delegation of a request to the installed helper.

use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, HelperErrorKind};
use crate::protocol::Response;

use super::{HelperCommand, HelperDiscovery};

/// Hand the raw request to the helper and return its reply.
///
/// With no helper installed the request is echoed back, or answered with a
/// pong if it does not parse as an object. Running a helper that fails or
/// prints something other than a JSON object is a [`BridgeError::Helper`].
pub async fn call_helper(
    config: &BridgeConfig,
    discovery: &dyn HelperDiscovery,
    message: &[u8],
) -> Result<Response, BridgeError> {
    let Some(helper) = discovery.find(&config.install_dir) else {
        debug!("Helper not found, echoing request");
        return Ok(echo_or_pong(message));
    };

    info!(helper = %helper.path.display(), "Delegating request to helper");

    let output = HelperCommand::for_helper(&helper, &config.install_dir)
        .input(message)
        .run()
        .await?;

    Response::parse(&output.stdout).map_err(|e| BridgeError::Helper {
        kind: HelperErrorKind::InvalidOutput {
            message: e.to_string(),
        },
    })
}

fn echo_or_pong(message: &[u8]) -> Response {
    Response::parse(message).unwrap_or_else(|_| Response::pong())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::ScriptDiscovery;
    use serde_json::{json, Value};
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> BridgeConfig {
        BridgeConfig::new(dir.to_path_buf(), &crate::config::Settings::default())
    }

    fn as_value(response: &Response) -> Value {
        serde_json::from_slice(&response.to_bytes().unwrap()).unwrap()
    }

    #[cfg(unix)]
    fn install_script(dir: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("helper.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn test_no_helper_echoes_request() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let discovery = ScriptDiscovery::new("helper.sh");

        let response = call_helper(&config, &discovery, br#"{"type":"foo","x":1}"#)
            .await
            .unwrap();
        assert_eq!(as_value(&response), json!({"type": "foo", "x": 1}));
    }

    #[tokio::test]
    async fn test_no_helper_unparsable_message_pongs() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let discovery = ScriptDiscovery::new("helper.sh");

        let response = call_helper(&config, &discovery, b"not json").await.unwrap();
        assert_eq!(response, Response::pong());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_reply_returned_unmodified() {
        let dir = TempDir::new().unwrap();
        install_script(dir.path(), "cat");
        let config = config_for(dir.path());
        let discovery = ScriptDiscovery::new("helper.sh");

        let request = br#"{"type":"bookmarks.list","page":2,"tags":["a","b"]}"#;
        let response = call_helper(&config, &discovery, request).await.unwrap();
        assert_eq!(
            as_value(&response),
            json!({"type": "bookmarks.list", "page": 2, "tags": ["a", "b"]})
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_runs_in_install_dir() {
        let dir = TempDir::new().unwrap();
        install_script(
            dir.path(),
            r#"cat > /dev/null
printf '{"type":"cwd","dir":"%s"}' "$(pwd -P)""#,
        );
        let config = config_for(dir.path());
        let discovery = ScriptDiscovery::new("helper.sh");

        let response = call_helper(&config, &discovery, br#"{"type":"where"}"#)
            .await
            .unwrap();
        let reported = response.get("dir").and_then(Value::as_str).unwrap();
        assert_eq!(
            std::path::PathBuf::from(reported),
            dir.path().canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_invalid_output() {
        let dir = TempDir::new().unwrap();
        install_script(dir.path(), "echo 'not json'");
        let config = config_for(dir.path());
        let discovery = ScriptDiscovery::new("helper.sh");

        let result = call_helper(&config, &discovery, br#"{"type":"foo"}"#).await;
        match result {
            Err(err @ BridgeError::Helper {
                kind: HelperErrorKind::InvalidOutput { .. },
            }) => assert!(err.is_delegation_fault()),
            other => panic!("expected invalid output, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_failure() {
        let dir = TempDir::new().unwrap();
        install_script(dir.path(), "cat > /dev/null; echo boom >&2; exit 2");
        let config = config_for(dir.path());
        let discovery = ScriptDiscovery::new("helper.sh");

        let result = call_helper(&config, &discovery, br#"{"type":"foo"}"#).await;
        assert!(matches!(
            result,
            Err(BridgeError::Helper {
                kind: HelperErrorKind::Failed { .. }
            })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_not_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("helper.sh");
        std::fs::write(&path, "#!/bin/sh\ncat\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let config = config_for(dir.path());
        let discovery = ScriptDiscovery::new("helper.sh");

        let result = call_helper(&config, &discovery, br#"{"type":"foo"}"#).await;
        assert!(matches!(
            result,
            Err(BridgeError::Helper {
                kind: HelperErrorKind::SpawnFailed { .. }
            })
        ));
    }
}
