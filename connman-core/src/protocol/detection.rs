//! Client detection utilities
//!
//! Reports whether the external client programs used by the launcher are
//! installed, and how to install them when they are not.

use std::env;
use std::path::{Path, PathBuf};

/// Information about a client program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Program name as invoked
    pub program: String,
    /// Full path to the program, if found on `PATH`
    pub path: Option<PathBuf>,
    /// Installation hint for missing clients
    pub install_hint: Option<&'static str>,
}

impl ClientInfo {
    /// Returns true if the program was found
    #[must_use]
    pub const fn installed(&self) -> bool {
        self.path.is_some()
    }
}

/// Looks up `program` on `PATH`
///
/// A program given as a path is checked directly.
#[must_use]
pub fn detect_client(program: &str) -> ClientInfo {
    let path = if program.contains(std::path::MAIN_SEPARATOR) {
        Some(PathBuf::from(program)).filter(|p| is_executable(p))
    } else {
        find_on_path(program, env::var_os("PATH").as_deref())
    };
    ClientInfo {
        program: program.to_string(),
        install_hint: path.is_none().then(|| install_hint(program)).flatten(),
        path,
    }
}

fn find_on_path(program: &str, path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    env::split_paths(path_var?)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn install_hint(program: &str) -> Option<&'static str> {
    match program {
        "ssh" => Some("Install OpenSSH: sudo apt install openssh-client (Debian/Ubuntu) or sudo dnf install openssh-clients (Fedora)"),
        "sshpass" => Some("Install sshpass: sudo apt install sshpass (Debian/Ubuntu) or sudo dnf install sshpass (Fedora)"),
        "xfreerdp" => Some("Install FreeRDP: sudo apt install freerdp2-x11 (Debian/Ubuntu) or sudo dnf install freerdp (Fedora)"),
        "vncviewer" => Some("Install TigerVNC: sudo apt install tigervnc-viewer (Debian/Ubuntu) or sudo dnf install tigervnc (Fedora)"),
        "xdg-open" => Some("Install xdg-utils: sudo apt install xdg-utils (Debian/Ubuntu) or sudo dnf install xdg-utils (Fedora)"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[test]
    fn test_finds_executable_on_path() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("fakeclient");
        fs::write(&bin, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let found = find_on_path("fakeclient", Some(temp.path().as_os_str()));
        assert_eq!(found, Some(bin));
    }

    #[cfg(unix)]
    #[test]
    fn test_ignores_non_executable() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("plainfile"), "x").unwrap();
        assert!(find_on_path("plainfile", Some(temp.path().as_os_str())).is_none());
    }

    #[test]
    fn test_missing_client_has_hint() {
        let info = detect_client("xfreerdp-that-does-not-exist");
        assert!(!info.installed());
        assert!(info.install_hint.is_none());

        let temp = TempDir::new().unwrap();
        assert!(find_on_path("vncviewer", Some(temp.path().as_os_str())).is_none());
        assert!(install_hint("vncviewer").is_some());
    }
}
