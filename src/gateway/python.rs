use std::path::{Path, PathBuf};

use crate::config::Config;

use super::error::GatewayError;

/// Interpreter inside a virtual environment.
pub fn venv_python(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("python.exe")
    } else {
        venv_dir.join("bin").join("python3")
    }
}

/// Pick the interpreter for the external scripts.
///
/// Order: the configured override, the project venv, then `python3` and
/// `python` on `PATH`. `config` is expected to be resolved against the
/// project root already.
pub fn resolve_python(config: &Config) -> Result<PathBuf, GatewayError> {
    if let Some(python) = &config.python {
        if python.components().count() == 1 {
            return which::which(python).map_err(|_| GatewayError::InterpreterNotFound {
                venv: config.venv_dir.clone(),
            });
        }
        return Ok(python.clone());
    }

    let venv = venv_python(&config.venv_dir);
    if venv.is_file() {
        return Ok(venv);
    }

    ["python3", "python"]
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| GatewayError::InterpreterNotFound {
            venv: config.venv_dir.clone(),
        })
}
