//! # Identity & Session
//!
//! Authentication itself happens elsewhere; by the time a request reaches
//! the ledger the caller knows the user id. This module turns that id into
//! a [`SessionContext`] by loading the owner's profile, and it manages the
//! profile fields the owner can edit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopbook_core::validation::{validate_business_name, validate_phone};
use shopbook_core::{ProfileUpdate, UserProfile};
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult, StoreResult, WorkflowStep};

/// The acting shop owner, passed explicitly into every ledger operation.
///
/// Stores scope every read and write to `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: String,
    pub business_name: String,
    pub is_pro: bool,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, business_name: impl Into<String>) -> Self {
        SessionContext {
            user_id: user_id.into(),
            business_name: business_name.into(),
            is_pro: false,
        }
    }

    pub fn from_profile(profile: &UserProfile) -> Self {
        SessionContext {
            user_id: profile.id.clone(),
            business_name: profile.business_name.clone(),
            is_pro: profile.is_pro,
        }
    }
}

/// Profile storage owned by the identity provider.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    async fn create_profile(&self, profile: &UserProfile) -> StoreResult<()>;

    /// Applies `update`; `None` when no profile exists for `user_id`.
    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserProfile>>;
}

/// Loads the profile for `user_id` and opens a session for it.
pub async fn open_session<I>(identity: &I, user_id: &str) -> LedgerResult<SessionContext>
where
    I: IdentityService + ?Sized,
{
    let profile = identity
        .profile(user_id)
        .await
        .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?
        .ok_or(LedgerError::Unauthenticated)?;

    debug!(user_id = %profile.id, is_pro = profile.is_pro, "Session opened");
    Ok(SessionContext::from_profile(&profile))
}

/// Creates the profile for a newly signed-up owner.
///
/// Returns the existing profile unchanged when one is already present.
pub async fn register_profile<I>(
    identity: &I,
    user_id: &str,
    phone: &str,
    business_name: &str,
) -> LedgerResult<UserProfile>
where
    I: IdentityService + ?Sized,
{
    validate_phone(phone)?;
    validate_business_name(business_name)?;

    if let Some(existing) = identity
        .profile(user_id)
        .await
        .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?
    {
        debug!(user_id = %user_id, "Profile already registered");
        return Ok(existing);
    }

    let now = Utc::now();
    let profile = UserProfile {
        id: user_id.to_string(),
        phone: phone.trim().to_string(),
        business_name: business_name.trim().to_string(),
        is_pro: false,
        created_at: now,
        updated_at: now,
    };

    identity
        .create_profile(&profile)
        .await
        .map_err(|e| LedgerError::from_store(WorkflowStep::SaveProfile, e))?;

    info!(user_id = %profile.id, business = %profile.business_name, "Profile registered");
    Ok(profile)
}

/// Updates the session owner's profile (business name, pro flag).
pub async fn update_profile<I>(
    identity: &I,
    ctx: &SessionContext,
    update: &ProfileUpdate,
) -> LedgerResult<UserProfile>
where
    I: IdentityService + ?Sized,
{
    if let Some(name) = &update.business_name {
        validate_business_name(name)?;
    }

    let profile = identity
        .update_profile(&ctx.user_id, update, Utc::now())
        .await
        .map_err(|e| LedgerError::from_store(WorkflowStep::SaveProfile, e))?
        .ok_or(LedgerError::Unauthenticated)?;

    info!(user_id = %profile.id, is_pro = profile.is_pro, "Profile updated");
    Ok(profile)
}
