use snap_types::UserProfile;
use tokio::sync::watch;

use crate::error::{BoardError, BoardResult};

/// Source of the signed-in user.
///
/// Sign-in and sign-out are delivered through a `watch` channel, so a
/// subscriber always sees the latest state and never a backlog.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserProfile>;

    fn subscribe(&self) -> watch::Receiver<Option<UserProfile>>;
}

/// In-process identity provider with explicit sign-in and sign-out.
#[derive(Debug)]
pub struct LocalIdentity {
    tx: watch::Sender<Option<UserProfile>>,
}

impl LocalIdentity {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn signed_in(user: UserProfile) -> Self {
        let identity = Self::new();
        identity.sign_in(user);
        identity
    }

    pub fn sign_in(&self, user: UserProfile) {
        tracing::info!(user = %user.id, "signed in");
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::info!("signed out");
        }
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<UserProfile> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.tx.subscribe()
    }
}

/// Who is acting. Passed explicitly into every board operation.
///
/// A session either follows an identity provider (and so tracks sign-in and
/// sign-out as they happen) or is fixed to one user for its lifetime, which
/// suits request-scoped callers such as the HTTP host.
#[derive(Clone, Debug)]
pub struct Session {
    user: watch::Receiver<Option<UserProfile>>,
}

impl Session {
    pub fn follow(provider: &dyn IdentityProvider) -> Self {
        Self {
            user: provider.subscribe(),
        }
    }

    pub fn fixed(user: Option<UserProfile>) -> Self {
        let (_tx, rx) = watch::channel(user);
        Self { user: rx }
    }

    pub fn anonymous() -> Self {
        Self::fixed(None)
    }

    pub fn signed_in(user: UserProfile) -> Self {
        Self::fixed(Some(user))
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.user.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.borrow().is_some()
    }

    /// The signed-in user, or `NotAuthenticated` naming `action`.
    pub fn require_user(&self, action: &'static str) -> BoardResult<UserProfile> {
        self.current_user()
            .ok_or(BoardError::NotAuthenticated { action })
    }

    /// Wait for the next sign-in or sign-out.
    ///
    /// Returns `None` once the provider is gone; fixed sessions return
    /// `None` immediately.
    pub async fn changed(&mut self) -> Option<Option<UserProfile>> {
        self.user.changed().await.ok()?;
        Some(self.user.borrow_and_update().clone())
    }
}
