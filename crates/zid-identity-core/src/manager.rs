//! Identity manager: validated create/update and guarded trait updates.

use crate::{
    context::Context,
    errors::{IdentityError, Result, ValidateError},
    protected::guard_protected_fields,
    traits::{PrivilegedPool, TraitValidator},
    types::{Identity, Traits, VerifiableAddress},
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Static manager configuration
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Validity of a freshly issued verification code
    pub verification_link_lifespan: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            verification_link_lifespan: Duration::hours(24),
        }
    }
}

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Return structured schema errors instead of a generic bad request
    pub expose_validation_errors: bool,
    /// Skip the protected-field guard. Only for internally trusted callers.
    pub allow_write_protected_traits: bool,
}

impl ManagerOptions {
    /// Options for trusted callers such as admin APIs: full validation detail.
    pub fn exposing_validation_errors() -> Self {
        Self::default().expose_validation_errors(true)
    }

    /// Options for privileged callers that may rewrite protected fields.
    pub fn privileged() -> Self {
        Self::default().allow_write_protected_traits(true)
    }

    pub fn expose_validation_errors(mut self, expose: bool) -> Self {
        self.expose_validation_errors = expose;
        self
    }

    pub fn allow_write_protected_traits(mut self, allow: bool) -> Self {
        self.allow_write_protected_traits = allow;
        self
    }
}

/// Identity manager
///
/// Holds no locks of its own; serialization of concurrent writers to the same
/// identity is left to the pool.
pub struct IdentityManager<P, V>
where
    P: PrivilegedPool,
    V: TraitValidator,
{
    pool: Arc<P>,
    validator: Arc<V>,
    config: ManagerConfig,
}

impl<P, V> IdentityManager<P, V>
where
    P: PrivilegedPool,
    V: TraitValidator,
{
    pub fn new(pool: Arc<P>, validator: Arc<V>, config: ManagerConfig) -> Self {
        Self {
            pool,
            validator,
            config,
        }
    }

    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Validate and persist a new identity.
    pub async fn create(
        &self,
        ctx: &Context,
        identity: &mut Identity,
        opts: ManagerOptions,
    ) -> Result<()> {
        ctx.check()?;
        self.validate(ctx, identity, opts).await?;
        ctx.run(self.pool.create_identity(identity)).await?;

        info!("Identity created: {}", identity.id);
        Ok(())
    }

    /// Validate and persist an identity, credentials and addresses included.
    ///
    /// This is a privileged operation and performs no protected-field guard.
    pub async fn update(
        &self,
        ctx: &Context,
        identity: &mut Identity,
        opts: ManagerOptions,
    ) -> Result<()> {
        ctx.check()?;
        self.validate(ctx, identity, opts).await?;
        ctx.run(self.pool.update_identity(identity)).await?;

        info!("Identity updated: {}", identity.id);
        Ok(())
    }

    /// Replace an identity's traits without letting the change reach its
    /// credentials or verifiable addresses.
    ///
    /// Unless `opts.allow_write_protected_traits` is set, a validator-side
    /// change to credentials or addresses aborts with
    /// [`IdentityError::ProtectedFieldModified`] and nothing is written.
    pub async fn update_traits(
        &self,
        ctx: &Context,
        id: Uuid,
        traits: Traits,
        opts: ManagerOptions,
    ) -> Result<()> {
        ctx.check()?;

        let mut identity = ctx.run(self.pool.get_identity_confidential(id)).await?;
        let original = identity.clone();

        identity.traits = traits;
        self.validate(ctx, &mut identity, opts).await?;

        if !opts.allow_write_protected_traits {
            if let Err(err) = guard_protected_fields(&mut identity, original) {
                warn!(
                    "Blocked unprivileged update of protected fields on identity {}",
                    id
                );
                return Err(err);
            }
        }

        ctx.run(self.pool.update_identity(&mut identity)).await?;

        info!("Identity traits updated: {}", id);
        Ok(())
    }

    /// Issue a new verification code for `address` and persist it.
    ///
    /// `address` is only modified once the store accepted the new code.
    pub async fn refresh_verify_address(
        &self,
        ctx: &Context,
        address: &mut VerifiableAddress,
    ) -> Result<()> {
        ctx.check()?;

        let mut refreshed = address.clone();
        refreshed.code = zid_crypto::new_verify_code()?;
        refreshed.expires_at = Utc::now() + self.config.verification_link_lifespan;
        ctx.run(self.pool.update_verifiable_address(&mut refreshed)).await?;
        *address = refreshed;

        info!("Verification code refreshed for address {}", address.id);
        Ok(())
    }

    async fn validate(
        &self,
        ctx: &Context,
        identity: &mut Identity,
        opts: ManagerOptions,
    ) -> Result<()> {
        let validator = Arc::clone(&self.validator);
        ctx.run(async move {
            match validator.validate(identity).await {
                Ok(()) => Ok(()),
                Err(ValidateError::Schema(e)) if !opts.expose_validation_errors => {
                    Err(IdentityError::BadRequest(e.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }
}
