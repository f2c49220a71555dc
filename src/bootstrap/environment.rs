use crate::error::ClusterError;
use crate::services::ServiceSpec;
use std::path::{Path, PathBuf};

/**
 * Location of the project and its Python virtual environment.
 * All paths are absolute so terminal windows can `cd` anywhere safely.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEnv {
    pub root: PathBuf,
    pub venv_dir: PathBuf,
    pub requirements: PathBuf,

    // Interpreter used to create the environment
    pub python: String,
}

impl RuntimeEnv {
    pub fn new(
        root: impl Into<PathBuf>,
        venv_dir: impl AsRef<Path>,
        requirements: impl AsRef<Path>,
        python: impl Into<String>,
    ) -> Self {
        let root = root.into();
        Self {
            venv_dir: root.join(venv_dir),
            requirements: root.join(requirements),
            python: python.into(),
            root,
        }
    }

    pub fn exists(&self) -> bool {
        self.venv_dir.is_dir()
    }

    /// Fail with `EnvironmentMissing` for actions that cannot bootstrap.
    pub fn require(&self) -> Result<(), ClusterError> {
        if self.exists() {
            Ok(())
        } else {
            Err(ClusterError::EnvironmentMissing(self.venv_dir.clone()))
        }
    }

    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.venv_dir.join("Scripts")
        } else {
            self.venv_dir.join("bin")
        }
    }

    pub fn interpreter(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("python.exe")
        } else {
            self.bin_dir().join("python")
        }
    }

    pub fn activate_script(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("activate.bat")
        } else {
            self.bin_dir().join("activate")
        }
    }

    /// Prefer the environment's copy of an executable, fall back to PATH lookup.
    pub fn resolve(&self, command: &str) -> String {
        let mut candidate = self.bin_dir().join(command);
        if cfg!(windows) && candidate.extension().is_none() {
            candidate.set_extension("exe");
        }
        if candidate.is_file() {
            candidate.to_string_lossy().into_owned()
        } else {
            command.to_string()
        }
    }

    pub fn service_dir(&self, spec: &ServiceSpec) -> PathBuf {
        self.root.join(&spec.working_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_anchored_at_root() {
        let env = RuntimeEnv::new("/srv/cluster", "venv", "requirements.txt", "python3");
        assert_eq!(env.venv_dir, PathBuf::from("/srv/cluster/venv"));
        assert_eq!(env.requirements, PathBuf::from("/srv/cluster/requirements.txt"));
        assert!(env.activate_script().starts_with("/srv/cluster/venv"));
    }

    #[test]
    fn test_missing_environment_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env = RuntimeEnv::new(dir.path(), "venv", "requirements.txt", "python3");
        let err = env.require().unwrap_err();
        assert!(matches!(err, ClusterError::EnvironmentMissing(_)));

        std::fs::create_dir_all(dir.path().join("venv")).unwrap();
        assert!(env.require().is_ok());
    }

    #[test]
    fn test_resolve_falls_back_to_plain_command() {
        let dir = tempfile::tempdir().unwrap();
        let env = RuntimeEnv::new(dir.path(), "venv", "requirements.txt", "python3");
        assert_eq!(env.resolve("python"), "python");

        std::fs::create_dir_all(env.bin_dir()).unwrap();
        std::fs::write(env.interpreter(), b"").unwrap();
        assert_eq!(env.resolve("python"), env.interpreter().to_string_lossy());
    }
}
