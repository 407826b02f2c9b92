use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Runs `command` (program plus whitespace-separated arguments) with the
/// reader URL appended as the last argument.
pub(crate) fn launch(command: &str, url: &str) -> anyhow::Result<Child> {
    let (program, args) =
        split_command(command).ok_or_else(|| anyhow::anyhow!("empty open command"))?;
    let program = resolve_program(program)
        .ok_or_else(|| anyhow::anyhow!("`{program}` not found on PATH"))?;

    let mut cmd = Command::new(program);
    cmd.args(args).arg(url);
    // The child must not inherit the raw-mode terminal.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd.spawn().map_err(Into::into)
}

/// Drops readers that have exited, collecting their status.
pub(crate) fn reap_finished(readers: &mut Vec<Child>) {
    readers.retain_mut(|child| match child.try_wait() {
        Ok(None) => true,
        Ok(Some(status)) => {
            tracing::debug!(pid = child.id(), %status, "reader exited");
            false
        }
        Err(err) => {
            tracing::warn!(pid = child.id(), error = %err, "failed to poll reader");
            false
        }
    });
}

fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

fn resolve_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return is_probably_executable(path).then(|| path.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    find_in_path_list(&paths, program)
}

fn find_in_path_list(paths: &OsStr, name: &str) -> Option<PathBuf> {
    std::env::split_paths(paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_probably_executable(candidate))
}

fn is_probably_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::metadata(path).is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
    }

    #[cfg(not(unix))]
    {
        true
    }
}
