//! REST behavior defaults.

use crate::auth::Requirement;

/// Response renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Json,
    BrowsableApi,
}

/// Request body parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parser {
    Form,
    MultiPart,
    Json,
}

/// Authenticator tried against each request, in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationClass {
    /// `Authorization: Bearer <jwt>` access tokens.
    Jwt,
    /// Cookie sessions. Owned by the host; skipped here.
    Session,
    /// `Authorization: Token <key>` legacy API keys.
    ApiKey,
}

/// Default permission applied to routes that do not declare their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionClass {
    AllowAny,
    IsAuthenticated,
    IsAdminUser,
}

impl PermissionClass {
    /// The guard requirement this permission enforces, if any.
    #[must_use]
    pub const fn requirement(self) -> Option<Requirement> {
        match self {
            Self::AllowAny => None,
            Self::IsAuthenticated => Some(Requirement::Authenticated),
            Self::IsAdminUser => Some(Requirement::Staff),
        }
    }
}

/// REST defaults shared by every API route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestDefaults {
    pub renderers: Vec<Renderer>,
    pub parsers: Vec<Parser>,
    pub authentication: Vec<AuthenticationClass>,
    pub permissions: Vec<PermissionClass>,
}

impl Default for RestDefaults {
    fn default() -> Self {
        Self {
            renderers: vec![Renderer::Json, Renderer::BrowsableApi],
            parsers: vec![Parser::Form, Parser::MultiPart, Parser::Json],
            authentication: vec![
                AuthenticationClass::Jwt,
                AuthenticationClass::Session,
                AuthenticationClass::ApiKey,
            ],
            permissions: vec![PermissionClass::IsAuthenticated],
        }
    }
}

impl RestDefaults {
    /// Append `class` to the authenticators unless already listed.
    pub fn ensure_authentication(&mut self, class: AuthenticationClass) -> bool {
        push_unique(&mut self.authentication, class)
    }

    /// Append `class` to the default permissions unless already listed.
    pub fn ensure_permission(&mut self, class: PermissionClass) -> bool {
        push_unique(&mut self.permissions, class)
    }

    /// The strictest requirement implied by the default permissions.
    ///
    /// `None` when every listed permission allows anonymous access.
    #[must_use]
    pub fn default_requirement(&self) -> Option<Requirement> {
        self.permissions
            .iter()
            .filter_map(|class| class.requirement())
            .max()
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if list.contains(&item) {
        return false;
    }
    list.push(item);
    true
}
