//! User repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::fulfillment::User;

/// Port for user lookups and the invite-link write.
///
/// Users are created by the checkout flow (external collaborator); this
/// service only reads them and records provisioned invite links.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks up a user by email, the key the provider reports payments under.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Looks up a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Records a freshly issued invite link on the user.
    async fn set_invite_link(&self, id: &UserId, invite_link: &str) -> Result<(), DomainError>;
}
