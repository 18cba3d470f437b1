//! Writing the certificate and key files, and the run summary.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::classify::split_hosts;
use crate::error::{CertgenError, Result};
use crate::template::CertificateRole;

/// `*.` followed by at most two labels, e.g. `*.localhost` or `*.example.com`.
static SECOND_LEVEL_WILDCARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\*\.[0-9a-z_-]+(?:\.[0-9a-z_-]+)?$")
        .unwrap_or_else(|e| panic!("invalid wildcard pattern: {e}"))
});

/// Where the certificate and its private key are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

impl OutputPaths {
    /// `public.crt` and `private.key`, or `client.crt` and `client.key` for
    /// a client certificate, inside `dir` when one is given.
    pub fn for_role(dir: Option<&Path>, role: CertificateRole) -> Self {
        let (certificate, private_key) = match role {
            CertificateRole::Client => ("client.crt", "client.key"),
            CertificateRole::CertificateAuthority | CertificateRole::Leaf => {
                ("public.crt", "private.key")
            }
        };
        let join = |name: &str| match dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        Self {
            certificate: join(certificate),
            private_key: join(private_key),
        }
    }
}

fn file_io_error(path: &Path, err: std::io::Error) -> CertgenError {
    CertgenError::FileIoError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Writes the certificate PEM, replacing any existing file.
pub fn write_certificate(path: &Path, pem: &str) -> Result<()> {
    fs::write(path, pem).map_err(|e| file_io_error(path, e))?;
    info!(path = %path.display(), "wrote certificate");
    Ok(())
}

/// Writes the private key PEM readable by the owner only, replacing any
/// existing file.
pub fn write_private_key(path: &Path, pem: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| file_io_error(path, e))?;

    // The mode above only applies to newly created files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| file_io_error(path, e))?;
    }

    file.write_all(pem.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| file_io_error(path, e))?;
    info!(path = %path.display(), "wrote private key");
    Ok(())
}

/// Human-readable report of a finished run.
///
/// Lists every accepted identifier, warns about second-level wildcards such
/// as `*.example.com`, and reminds once that wildcards match a single label.
///
/// # Example
/// ```
/// use certgen::output::{OutputPaths, summary};
/// use certgen::template::CertificateRole;
///
/// let paths = OutputPaths::for_role(None, CertificateRole::Leaf);
/// let text = summary("localhost, *.example.com", &paths);
/// assert!(text.contains(" - \"localhost\"\n"));
/// assert!(text.contains("second-level wildcards"));
/// ```
pub fn summary(hosts: &str, paths: &OutputPaths) -> String {
    let mut lines = vec![format!(
        "Created a new certificate '{}', '{}' valid for the following names 📜",
        paths.certificate.display(),
        paths.private_key.display()
    )];

    for host in split_hosts(hosts) {
        lines.push(format!(" - {host:?}"));
        if SECOND_LEVEL_WILDCARD.is_match(host) {
            lines.push(format!(
                "   Warning: many browsers don't support second-level wildcards like {host:?} ⚠️"
            ));
        }
    }

    if let Some(domain) = split_hosts(hosts).find_map(|host| host.strip_prefix("*.")) {
        lines.push(format!(
            "\nReminder: X.509 wildcards only go one level deep, so this won't match a.b.{domain} ℹ️"
        ));
    }

    lines.iter().map(|line| format!("{line}\n")).collect()
}
