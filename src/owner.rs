//! The `user@host (Full Name)` string placed in the subject's organizational unit.

use tracing::debug;

/// Login and full name of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Account {
    username: String,
    full_name: String,
}

/// Builds the identity string of the local user.
///
/// Missing pieces are left out rather than reported: an unknown user drops
/// the `user@` prefix, an unresolvable hostname drops the host, and the full
/// name is only appended when it is known and differs from the user name.
pub fn user_and_hostname() -> String {
    let account = current_account();
    let hostname = hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().into_owned());

    let identity = format_identity(account.as_ref(), hostname.as_deref());
    debug!(%identity, "resolved local identity");
    identity
}

/// Looks up the account of the real user id in the system user database.
#[cfg(unix)]
fn current_account() -> Option<Account> {
    use nix::unistd::{User, getuid};

    let user = match User::from_uid(getuid()) {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!(uid = %getuid(), "no user database entry for uid");
            return None;
        }
        Err(e) => {
            debug!(error = %e, "user lookup failed");
            return None;
        }
    };

    Some(Account {
        full_name: gecos_full_name(&user.gecos.to_string_lossy()),
        username: user.name,
    })
}

#[cfg(not(unix))]
fn current_account() -> Option<Account> {
    None
}

/// The full name is the first comma-separated GECOS field.
fn gecos_full_name(gecos: &str) -> String {
    gecos.split(',').next().unwrap_or_default().trim().to_string()
}

fn format_identity(account: Option<&Account>, hostname: Option<&str>) -> String {
    let mut identity = String::new();

    if let Some(account) = account {
        identity.push_str(&account.username);
        identity.push('@');
    }
    if let Some(host) = hostname {
        identity.push_str(host);
    }
    if let Some(account) = account {
        if !account.full_name.is_empty() && account.full_name != account.username {
            identity.push_str(" (");
            identity.push_str(&account.full_name);
            identity.push(')');
        }
    }

    identity
}
