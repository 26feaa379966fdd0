//! One-time settings mutator.
//!
//! [`configure`] brings host settings up to what the auth stack needs:
//! managed extensions, middleware stages, REST defaults, token policy,
//! cookie paths, static/media paths and cross-origin lists.
//!
//! # Pre-conditions
//! - The middleware chain contains the `common` anchor, and the `security`
//!   anchor when static serving is enabled.
//!
//! # Post-conditions
//! - `cors` sits before `common`; `csrf` sits immediately after `common`.
//! - `static_files` sits immediately after `security` when enabled.
//! - `rest_defaults` and `token_policy` are populated.
//!
//! # Invariants
//! - Running twice with the same options leaves the settings unchanged.
//! - Values set by the caller are kept; only the token policy is refreshed.

use std::path::{Path, PathBuf};

use super::names::{CORE_PREFIX, MANAGED_PREFIX, extension, stage};
use super::pipeline::{self, Placement, StageSpec};
use super::{
    AuthenticationClass, CorsOptions, EXTENSIONS_LIST, MIDDLEWARE_LIST, PermissionClass,
    RestDefaults, Settings, SettingsError, TokenPolicy, configure_cors,
};

const EXTENSION_BLOCK: Placement = Placement::AfterLastWithPrefix(&[CORE_PREFIX, MANAGED_PREFIX]);

const DEFAULT_STATIC_URL: &str = "/static/";
const DEFAULT_MEDIA_URL: &str = "/media/";
const DEFAULT_COOKIE_PATH: &str = "/";

/// Inputs to a configuration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureOptions {
    /// Hosts and ports admitted by the cross-origin policy.
    pub cors: CorsOptions,
    /// Access-token lifetime.
    pub token_lifetime_minutes: u64,
    /// Serve static and media files from the configured roots.
    pub serve_static: bool,
}

impl Default for ConfigureOptions {
    fn default() -> Self {
        Self {
            cors: CorsOptions {
                hosts: vec!["localhost".to_string()],
                ports: vec![3000],
            },
            token_lifetime_minutes: 60,
            serve_static: true,
        }
    }
}

/// What a configuration pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureReport {
    pub extensions_added: Vec<&'static str>,
    pub stages_added: Vec<&'static str>,
    pub rest_defaults_created: bool,
    pub rest_classes_added: usize,
    pub cors_entries_added: usize,
    pub directories_created: Vec<PathBuf>,
}

impl ConfigureReport {
    /// True when the pass found nothing to add.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.extensions_added.is_empty()
            && self.stages_added.is_empty()
            && !self.rest_defaults_created
            && self.rest_classes_added == 0
            && self.cors_entries_added == 0
            && self.directories_created.is_empty()
    }
}

fn extension_specs(serve_static: bool) -> Vec<StageSpec> {
    let mut specs = vec![
        StageSpec::new(extension::REST, EXTENSION_BLOCK),
        StageSpec::new(extension::API_KEYS, EXTENSION_BLOCK),
        StageSpec::new(extension::CORS, EXTENSION_BLOCK),
        StageSpec::new(extension::JWT, EXTENSION_BLOCK),
        StageSpec::new(extension::JWT_BLACKLIST, EXTENSION_BLOCK),
    ];
    if serve_static {
        specs.push(StageSpec::new(extension::STATIC_FILES, EXTENSION_BLOCK));
    }
    specs
}

fn stage_specs(serve_static: bool) -> Vec<StageSpec> {
    let mut specs = vec![
        StageSpec::new(stage::CORS, Placement::Before(stage::COMMON)),
        StageSpec::new(stage::CSRF, Placement::After(stage::COMMON)),
    ];
    if serve_static {
        specs.push(StageSpec::new(stage::STATIC_FILES, Placement::After(stage::SECURITY)));
    }
    specs
}

/// Configure `settings` for the auth stack.
///
/// # Errors
/// Returns `SettingsError::AnchorNotFound` if a middleware anchor is missing;
/// nothing has been changed in that case. Returns `SettingsError::Io` if a
/// static or media root cannot be created.
pub fn configure(
    settings: &mut Settings,
    options: &ConfigureOptions,
) -> Result<ConfigureReport, SettingsError> {
    let mut report = ConfigureReport {
        // Anchors are checked first so a broken chain aborts before any change.
        stages_added: pipeline::ensure_all(
            &mut settings.middleware,
            MIDDLEWARE_LIST,
            &stage_specs(options.serve_static),
        )?,
        extensions_added: pipeline::ensure_all(
            &mut settings.installed_extensions,
            EXTENSIONS_LIST,
            &extension_specs(options.serve_static),
        )?,
        ..ConfigureReport::default()
    };

    configure_rest(settings, &mut report);

    settings.token_policy = Some(TokenPolicy::with_access_minutes(
        options.token_lifetime_minutes,
    ));

    settings
        .csrf_cookie_path
        .get_or_insert_with(|| DEFAULT_COOKIE_PATH.to_string());
    settings
        .session_cookie_path
        .get_or_insert_with(|| DEFAULT_COOKIE_PATH.to_string());

    if options.serve_static {
        configure_static(settings, &mut report)?;
    }

    report.cors_entries_added = configure_cors(settings, &options.cors);

    if report.is_noop() {
        tracing::debug!("settings already configured");
    } else {
        tracing::info!(
            extensions = ?report.extensions_added,
            stages = ?report.stages_added,
            cors_entries = report.cors_entries_added,
            "configured settings"
        );
    }

    Ok(report)
}

fn configure_rest(settings: &mut Settings, report: &mut ConfigureReport) {
    let rest = settings.rest_defaults.get_or_insert_with(|| {
        report.rest_defaults_created = true;
        RestDefaults::default()
    });

    if rest.ensure_authentication(AuthenticationClass::Jwt) {
        report.rest_classes_added += 1;
    }
    if rest.ensure_permission(PermissionClass::IsAuthenticated) {
        report.rest_classes_added += 1;
    }
}

fn configure_static(
    settings: &mut Settings,
    report: &mut ConfigureReport,
) -> Result<(), SettingsError> {
    let base_dir = settings.base_dir.clone();

    let static_root = settings
        .static_root
        .get_or_insert_with(|| base_dir.join("static"))
        .clone();
    let media_root = settings
        .media_root
        .get_or_insert_with(|| base_dir.join("media"))
        .clone();
    settings
        .static_url
        .get_or_insert_with(|| DEFAULT_STATIC_URL.to_string());
    settings
        .media_url
        .get_or_insert_with(|| DEFAULT_MEDIA_URL.to_string());

    for root in [static_root, media_root] {
        if ensure_directory(&root)? {
            report.directories_created.push(root);
        }
    }

    Ok(())
}

/// Create `path` if it does not exist. Returns `true` when it was created.
fn ensure_directory(path: &Path) -> Result<bool, SettingsError> {
    if path.exists() {
        return Ok(false);
    }

    std::fs::create_dir_all(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("created directory {}", path.display());
    Ok(true)
}
