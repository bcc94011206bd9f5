//! Invocation of the external `sonar-scanner` process

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

const SCANNER_BIN: &str = "sonar-scanner";

/// A fully specified scanner run for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCommand {
    pub program: PathBuf,
    pub project_key: String,
    pub project_name: String,
    pub source_path: PathBuf,
    pub host_url: String,
    token: String,
}

/// Captured result of a scanner process that exited successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ScanCommand {
    pub fn new(
        scanner_dir: Option<&Path>,
        project_key: &str,
        project_name: &str,
        source_path: &Path,
        host_url: &str,
        token: &str,
    ) -> Self {
        let program = match scanner_dir {
            Some(dir) => dir.join(SCANNER_BIN),
            None => PathBuf::from(SCANNER_BIN),
        };

        Self {
            program,
            project_key: project_key.to_string(),
            project_name: project_name.to_string(),
            source_path: source_path.to_path_buf(),
            host_url: host_url.to_string(),
            token: token.to_string(),
        }
    }

    /// `-D` properties handed to the scanner.
    pub fn args(&self) -> Vec<String> {
        self.properties(&self.source_path)
    }

    fn properties(&self, sources: &Path) -> Vec<String> {
        vec![
            format!("-Dsonar.projectKey={}", self.project_key),
            format!("-Dsonar.projectName={}", self.project_name),
            format!("-Dsonar.sources={}", sources.display()),
            format!("-Dsonar.host.url={}", self.host_url),
            format!("-Dsonar.token={}", self.token),
        ]
    }

    /// Runs the scanner from inside the source directory and waits for it.
    ///
    /// The source path is resolved to an absolute path first, so a relative
    /// path names the same directory for the working directory and for
    /// `sonar.sources`.
    pub async fn run(&self) -> crate::Result<ScanOutcome> {
        if !self.source_path.is_dir() {
            return Err(crate::HarvestError::InvalidPath(self.source_path.clone()));
        }
        let source_path = tokio::fs::canonicalize(&self.source_path).await?;

        info!("Running {}", self);

        // the child runs inside the source directory, so anchor relative program paths here
        let program = if self.program.is_relative() && self.program.components().count() > 1 {
            std::env::current_dir()?.join(&self.program)
        } else {
            self.program.clone()
        };

        let output = Command::new(&program)
            .args(self.properties(&source_path))
            .current_dir(&source_path)
            .output()
            .await
            .map_err(|e| {
                crate::HarvestError::Scan(format!(
                    "could not start {}: {}",
                    program.display(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        debug!("Scanner output for {}:\n{}", self.project_key, stdout);

        match output.status.code() {
            Some(0) => Ok(ScanOutcome {
                exit_code: 0,
                stdout,
                stderr,
            }),
            code => Err(crate::HarvestError::ScanFailed { code, stderr }),
        }
    }
}

impl fmt::Display for ScanCommand {
    /// Shell form of the command with the token masked.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in self.args() {
            if arg.starts_with("-Dsonar.token=") {
                write!(f, " \"-Dsonar.token=****\"")?;
            } else {
                write!(f, " \"{}\"", arg)?;
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn command(source: &Path) -> ScanCommand {
        ScanCommand::new(
            Some(Path::new("/opt/sonar-scanner/bin")),
            "Scan07",
            "Scan 07",
            source,
            "http://localhost:9000",
            "sqp_secret",
        )
    }

    #[test]
    fn test_args_carry_project_settings() {
        let cmd = command(Path::new("/src/app"));
        assert_eq!(
            cmd.program,
            PathBuf::from("/opt/sonar-scanner/bin/sonar-scanner")
        );
        let args = cmd.args();
        assert!(args.contains(&"-Dsonar.projectKey=Scan07".to_string()));
        assert!(args.contains(&"-Dsonar.projectName=Scan 07".to_string()));
        assert!(args.contains(&"-Dsonar.host.url=http://localhost:9000".to_string()));
        assert!(args.contains(&"-Dsonar.token=sqp_secret".to_string()));
    }

    #[test]
    fn test_display_masks_token() {
        let shown = command(Path::new("/src/app")).to_string();
        assert!(shown.contains("-Dsonar.projectKey=Scan07"));
        assert!(!shown.contains("sqp_secret"));
        assert!(shown.contains("****"));
    }

    #[test]
    fn test_program_defaults_to_path_lookup() {
        let cmd = ScanCommand::new(None, "k", "n", Path::new("."), "http://x", "t");
        assert_eq!(cmd.program, PathBuf::from("sonar-scanner"));
    }

    #[tokio::test]
    async fn test_run_rejects_missing_source_path() {
        let cmd = command(Path::new("/definitely/not/here"));
        let err = cmd.run().await.unwrap_err();
        assert!(matches!(err, crate::HarvestError::InvalidPath(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_run_reports_missing_scanner() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ScanCommand::new(
            Some(dir.path()),
            "k",
            "n",
            dir.path(),
            "http://localhost:9000",
            "t",
        );
        let err = cmd.run().await.unwrap_err();
        assert!(matches!(err, crate::HarvestError::Scan(_)));
        assert!(err.is_collaborator());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_output_of_successful_scan() {
        let bin = tempfile::tempdir().unwrap();
        fake::install(
            bin.path(),
            "echo \"INFO: ANALYSIS SUCCESSFUL\"\necho \"WARN: no SCM\" >&2\nexit 0",
        );
        let source = tempfile::tempdir().unwrap();

        let cmd = ScanCommand::new(Some(bin.path()), "k", "n", source.path(), "http://x", "t");
        let outcome = cmd.run().await.unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.contains("ANALYSIS SUCCESSFUL"));
        assert!(outcome.stderr.contains("WARN: no SCM"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_turns_nonzero_exit_into_scan_failed() {
        let bin = tempfile::tempdir().unwrap();
        fake::install(bin.path(), "echo \"ERROR: Not authorized\" >&2\nexit 3");
        let source = tempfile::tempdir().unwrap();

        let cmd = ScanCommand::new(Some(bin.path()), "k", "n", source.path(), "http://x", "t");
        let err = cmd.run().await.unwrap_err();

        match &err {
            crate::HarvestError::ScanFailed { code, stderr } => {
                assert_eq!(*code, Some(3));
                assert!(stderr.contains("Not authorized"));
            }
            other => panic!("expected ScanFailed, got {:?}", other),
        }
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_resolves_relative_source_path() {
        let bin = tempfile::tempdir().unwrap();
        fake::install(
            bin.path(),
            r#"for arg in "$@"; do
  case "$arg" in
    -Dsonar.sources=*) sources="${arg#-Dsonar.sources=}" ;;
  esac
done
if [ ! -d "$sources" ]; then
  echo "folder $sources does not exist" >&2
  exit 1
fi
echo "cwd=$(pwd) sources=$sources""#,
        );

        // relative to the test's working directory
        let work = tempfile::tempdir_in(".").unwrap();
        let relative = work.path().join("proj").join("src");
        std::fs::create_dir_all(&relative).unwrap();
        assert!(relative.is_relative());

        let cmd = ScanCommand::new(Some(bin.path()), "k", "n", &relative, "http://x", "t");
        let outcome = cmd.run().await.unwrap();

        let absolute = std::fs::canonicalize(&relative).unwrap();
        assert!(outcome
            .stdout
            .contains(&format!("sources={}", absolute.display())));
    }
}
