//! Cross-origin configuration.
//!
//! Builds origin lists from a set of host names and ports and merges them
//! into the settings lists that drive the CORS layer and CSRF origin checks.
//!
//! # Invariants
//! - Merged lists never contain duplicates.
//! - Entries already present keep their position.

use super::Settings;

const SCHEMES: [&str; 2] = ["http", "https"];

/// Hosts and ports the cross-origin policy should admit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsOptions {
    pub hosts: Vec<String>,
    pub ports: Vec<u16>,
}

/// Every origin for `hosts` across `http`/`https`, with and without a port.
///
/// For each host the ported variants come first, followed by the host-only
/// variants. Duplicates are dropped, keeping the first occurrence.
#[must_use]
pub fn origins_for(hosts: &[String], ports: &[u16]) -> Vec<String> {
    let mut origins = Vec::with_capacity(hosts.len() * (ports.len() + 1) * SCHEMES.len());

    for host in hosts {
        for port in ports {
            for scheme in SCHEMES {
                push_unique(&mut origins, format!("{scheme}://{host}:{port}"));
            }
        }
        for scheme in SCHEMES {
            push_unique(&mut origins, format!("{scheme}://{host}"));
        }
    }

    origins
}

/// Merge the origins for `options` into the cross-origin, CSRF-trusted and
/// allowed-host lists of `settings`.
///
/// # Returns
/// The number of entries added across all three lists.
pub fn configure_cors(settings: &mut Settings, options: &CorsOptions) -> usize {
    let origins = origins_for(&options.hosts, &options.ports);

    let mut added = 0;
    added += merge(&mut settings.cors_allowed_origins, &origins);
    added += merge(&mut settings.csrf_trusted_origins, &origins);
    added += merge(&mut settings.allowed_hosts, &options.hosts);
    added
}

fn merge(target: &mut Vec<String>, entries: &[String]) -> usize {
    entries
        .iter()
        .filter(|entry| push_unique(target, (*entry).clone()))
        .count()
}

fn push_unique(list: &mut Vec<String>, entry: String) -> bool {
    if list.contains(&entry) {
        return false;
    }
    list.push(entry);
    true
}
