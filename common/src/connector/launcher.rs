// Script launcher
//
// Builds the interpreter command for a destination script and starts it
// without waiting. Callers may opt into awaiting the returned handle.

use crate::errors::ConnectorError;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::instrument;

pub const SCRIPT_EXTENSION: &str = ".py";

/// Force a trailing `/` on the repository directory
pub fn normalize_repository_path(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Force the `.py` extension on a script name
pub fn normalize_script_name(name: &str) -> String {
    if name.ends_with(SCRIPT_EXTENSION) {
        name.to_string()
    } else {
        format!("{}{}", name, SCRIPT_EXTENSION)
    }
}

/// Maps paths as stored in the ERP onto the local filesystem
pub trait PathResolver: Send + Sync {
    fn real_path(&self, path: &str) -> PathBuf;
}

/// Resolves paths relative to the web application's content directory
#[derive(Debug, Clone)]
pub struct WebContentRoot {
    root: PathBuf,
}

impl WebContentRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PathResolver for WebContentRoot {
    fn real_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

/// What to start: repository directory, script and its arguments
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub repository_path: String,
    pub script_name: String,
    pub arguments: Vec<String>,
}

impl std::fmt::Debug for LaunchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchRequest")
            .field("repository_path", &self.repository_path)
            .field("script_name", &self.script_name)
            .field("arguments", &self.arguments.len())
            .finish()
    }
}

/// Outcome of awaiting a launched script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptExit {
    /// `None` when the process was killed by a signal or is not tracked
    pub code: Option<i32>,
}

impl ScriptExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ScriptExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Handle on a started script
#[derive(Debug)]
pub struct LaunchHandle {
    script_path: PathBuf,
    child: Option<Child>,
}

impl LaunchHandle {
    pub fn new(script_path: PathBuf, child: Child) -> Self {
        Self {
            script_path,
            child: Some(child),
        }
    }

    /// Handle with no process behind it
    pub fn detached(script_path: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            child: None,
        }
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Wait for the script to finish, killing it once `timeout` elapses
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<ScriptExit, ConnectorError> {
        let Some(mut child) = self.child.take() else {
            return Ok(ScriptExit { code: None });
        };

        let status = match timeout {
            None => child.wait().await,
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_elapsed) => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "Failed to kill timed out script");
                    }
                    return Err(ConnectorError::ScriptTimedOut {
                        path: self.script_path,
                        seconds: limit.as_secs(),
                    });
                }
            },
        };

        status
            .map(ScriptExit::from)
            .map_err(|e| ConnectorError::ScriptLaunchFailed {
                path: self.script_path,
                reason: e.to_string(),
            })
    }
}

/// Starts destination scripts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScriptLauncher: Send + Sync {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle, ConnectorError>;
}

/// Launches scripts as interpreter child processes
pub struct ProcessLauncher {
    interpreter: String,
    resolver: Arc<dyn PathResolver>,
    capture_output: bool,
}

impl ProcessLauncher {
    pub fn new(interpreter: impl Into<String>, resolver: Arc<dyn PathResolver>) -> Self {
        Self {
            interpreter: interpreter.into(),
            resolver,
            capture_output: true,
        }
    }

    /// Merge stdout and stderr into `<script>.log` in the working directory
    pub fn with_capture_output(mut self, capture_output: bool) -> Self {
        self.capture_output = capture_output;
        self
    }

    /// Real paths of the script and of its working directory
    pub fn resolve_paths(&self, request: &LaunchRequest) -> (PathBuf, PathBuf) {
        let repository = normalize_repository_path(&request.repository_path);
        let script = normalize_script_name(&request.script_name);
        let script_path = self.resolver.real_path(&format!("{}{}", repository, script));
        let working_dir = self.resolver.real_path(&repository);
        (script_path, working_dir)
    }

    /// Streams for the child's stdout and stderr
    ///
    /// An output log that cannot be opened does not block the launch; the
    /// output is discarded instead.
    fn output_streams(&self, script_path: &Path, working_dir: &Path) -> (Stdio, Stdio) {
        if !self.capture_output {
            return (Stdio::null(), Stdio::null());
        }

        let stem = script_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        let log_path = working_dir.join(format!("{}.log", stem));

        let opened = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .and_then(|file| Ok((file.try_clone()?, file)));
        match opened {
            Ok((stderr, stdout)) => (Stdio::from(stdout), Stdio::from(stderr)),
            Err(e) => {
                tracing::warn!(
                    path = %log_path.display(),
                    error = %e,
                    "Cannot open script output log, discarding output"
                );
                (Stdio::null(), Stdio::null())
            }
        }
    }
}

#[async_trait]
impl ScriptLauncher for ProcessLauncher {
    #[instrument(skip(self, request), fields(script = %request.script_name))]
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle, ConnectorError> {
        let (script_path, working_dir) = self.resolve_paths(request);

        if !tokio::fs::try_exists(&script_path).await.unwrap_or(false) {
            tracing::error!(path = %script_path.display(), "Script not found");
            return Err(ConnectorError::ScriptNotFound { path: script_path });
        }

        let launch_failed = |reason: String| ConnectorError::ScriptLaunchFailed {
            path: script_path.clone(),
            reason,
        };

        let (stdout, stderr) = self.output_streams(&script_path, &working_dir);

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&script_path)
            .args(&request.arguments)
            .current_dir(&working_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(false);

        // The script may vanish between the existence check and spawn
        let child = cmd.spawn().map_err(|e| launch_failed(e.to_string()))?;

        tracing::debug!(
            path = %script_path.display(),
            pid = child.id(),
            "Executing script"
        );
        Ok(LaunchHandle::new(script_path, child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(repo: &str, script: &str, args: &[&str]) -> LaunchRequest {
        LaunchRequest {
            repository_path: repo.to_string(),
            script_name: script.to_string(),
            arguments: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_repository_path_normalization() {
        assert_eq!(normalize_repository_path("/data/scripts"), "/data/scripts/");
        assert_eq!(normalize_repository_path("/data/scripts/"), "/data/scripts/");
    }

    #[test]
    fn test_script_name_normalization_is_idempotent() {
        assert_eq!(normalize_script_name("export"), "export.py");
        assert_eq!(normalize_script_name("export.py"), "export.py");
        assert_eq!(
            normalize_script_name(&normalize_script_name("export")),
            "export.py"
        );
    }

    #[test]
    fn test_web_content_root_joins_relative_and_absolute() {
        let root = WebContentRoot::new("/srv/etendo");
        assert_eq!(
            root.real_path("/web/scripts/export.py"),
            PathBuf::from("/srv/etendo/web/scripts/export.py")
        );
        assert_eq!(
            root.real_path("web/scripts/"),
            PathBuf::from("/srv/etendo/web/scripts/")
        );
    }

    #[test]
    fn test_resolve_paths() {
        let launcher = ProcessLauncher::new("python3", Arc::new(WebContentRoot::new("/srv")));
        let (script, dir) = launcher.resolve_paths(&request("/repo", "sync", &[]));
        assert_eq!(script, PathBuf::from("/srv/repo/sync.py"));
        assert_eq!(dir, PathBuf::from("/srv/repo/"));
    }

    #[tokio::test]
    async fn test_missing_script_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ProcessLauncher::new("python3", Arc::new(WebContentRoot::new(dir.path())));

        let result = launcher.launch(&request("repo", "missing", &[])).await;
        assert!(matches!(result, Err(ConnectorError::ScriptNotFound { .. })));
    }

    #[tokio::test]
    async fn test_unknown_interpreter_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("repo")).unwrap();
        std::fs::write(dir.path().join("repo/export.py"), "print('hi')\n").unwrap();
        let launcher = ProcessLauncher::new(
            "definitely-not-an-interpreter-xyz",
            Arc::new(WebContentRoot::new(dir.path())),
        );

        let result = launcher.launch(&request("repo", "export", &[])).await;
        assert!(matches!(result, Err(ConnectorError::ScriptLaunchFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_merges_output_and_passes_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::write(
            repo.join("export.py"),
            "echo \"args:$1|$2\"\necho \"cwd:$(pwd)\"\necho oops >&2\n",
        )
        .unwrap();

        let launcher = ProcessLauncher::new("sh", Arc::new(WebContentRoot::new(dir.path())));
        let handle = launcher
            .launch(&request("repo", "export", &["a b", "c,d"]))
            .await
            .unwrap();
        assert!(handle.pid().is_some());

        let exit = handle.wait(Some(Duration::from_secs(10))).await.unwrap();
        assert!(exit.success());

        let log = std::fs::read_to_string(repo.join("export.log")).unwrap();
        assert!(log.contains("args:a b|c,d"));
        assert!(log.contains("oops"));
        assert!(log.contains(&format!("cwd:{}", repo.canonicalize().unwrap().display())));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unwritable_output_log_still_launches() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(repo.join("export.log")).unwrap();
        std::fs::write(repo.join("export.py"), "echo done\n").unwrap();

        let launcher = ProcessLauncher::new("sh", Arc::new(WebContentRoot::new(dir.path())));
        let handle = launcher.launch(&request("repo", "export", &[])).await.unwrap();

        let exit = handle.wait(Some(Duration::from_secs(10))).await.unwrap();
        assert!(exit.success());
        assert!(repo.join("export.log").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_wait_times_out_and_kills() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::write(repo.join("slow.py"), "sleep 30\n").unwrap();

        let launcher = ProcessLauncher::new("sh", Arc::new(WebContentRoot::new(dir.path())))
            .with_capture_output(false);
        let handle = launcher.launch(&request("repo", "slow", &[])).await.unwrap();

        let result = handle.wait(Some(Duration::from_millis(200))).await;
        assert!(matches!(result, Err(ConnectorError::ScriptTimedOut { .. })));
    }

    #[tokio::test]
    async fn test_detached_handle_waits_immediately() {
        let exit = LaunchHandle::detached("/x.py").wait(None).await.unwrap();
        assert_eq!(exit.code, None);
        assert!(!exit.success());
    }
}
