//! Member access policy and scoped elevation.
//!
//! Public members are always reachable. Reaching a private, protected or
//! package member requires the active [`MemberAccess`] policy to allow it,
//! in which case the policy *elevates* the member for the duration of one
//! access: [`MemberAccess::setup`] grants and returns an [`AccessToken`],
//! and [`MemberAccess::restore`] consumes that token to revoke the grant.
//!
//! [`ElevationScope`] pairs the two calls so the grant is released on every
//! exit path.

use std::fmt;

use crate::{
    context::EvalContext,
    error::{AccessError, EvalError, EvalResult},
    reflect::{Member, Visibility},
    value::Value,
};

/// Outcome of [`MemberAccess::setup`], handed back to
/// [`MemberAccess::restore`] exactly once.
#[must_use = "an access token must be passed back to `restore`"]
#[derive(Debug, PartialEq, Eq)]
pub enum AccessToken {
    /// Nothing was changed; restoring is a no-op.
    Unchanged,
    /// Setup elevated the member; `was_accessible` records the member's
    /// accessibility before the call, which is always `false` for tokens a
    /// well-behaved policy produces.
    Elevated { was_accessible: bool },
}

/// Decides which members expressions may reach and elevates them on demand.
pub trait MemberAccess: Send + Sync + fmt::Debug {
    /// Whether `member` may be accessed. `target` and `property_name` are
    /// available to custom policies.
    fn is_accessible(
        &self,
        ctx: &EvalContext,
        target: &Value,
        member: &Member,
        property_name: &str,
    ) -> bool;

    /// Makes `member` accessible for one access if the policy allows it and
    /// it is not accessible already.
    fn setup(
        &self,
        ctx: &EvalContext,
        target: &Value,
        member: &Member,
        property_name: &str,
    ) -> AccessToken;

    /// Undoes what `setup` did, given the token it returned.
    fn restore(
        &self,
        ctx: &EvalContext,
        target: &Value,
        member: &Member,
        property_name: &str,
        token: AccessToken,
    ) -> Result<(), AccessError>;
}

/// Coarse-grained policy with one switch per non-public visibility.
///
/// The default allows public members only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultMemberAccess {
    pub allow_private: bool,
    pub allow_protected: bool,
    pub allow_package_protected: bool,
}

impl DefaultMemberAccess {
    pub fn new(allow_private: bool, allow_protected: bool, allow_package_protected: bool) -> Self {
        Self {
            allow_private,
            allow_protected,
            allow_package_protected,
        }
    }

    /// Sets all three switches to `allow`.
    pub fn allow_all(allow: bool) -> Self {
        Self::new(allow, allow, allow)
    }

    pub fn allow_private(&self) -> bool {
        self.allow_private
    }

    pub fn set_allow_private(&mut self, value: bool) {
        self.allow_private = value;
    }

    pub fn allow_protected(&self) -> bool {
        self.allow_protected
    }

    pub fn set_allow_protected(&mut self, value: bool) {
        self.allow_protected = value;
    }

    pub fn allow_package_protected(&self) -> bool {
        self.allow_package_protected
    }

    pub fn set_allow_package_protected(&mut self, value: bool) {
        self.allow_package_protected = value;
    }

    /// The policy decision for one visibility class.
    pub fn permits(&self, visibility: Visibility) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Private => self.allow_private,
            Visibility::Protected => self.allow_protected,
            Visibility::Package => self.allow_package_protected,
        }
    }
}

impl MemberAccess for DefaultMemberAccess {
    fn is_accessible(&self, _: &EvalContext, _: &Value, member: &Member, _: &str) -> bool {
        self.permits(member.visibility())
    }

    fn setup(
        &self,
        ctx: &EvalContext,
        target: &Value,
        member: &Member,
        property_name: &str,
    ) -> AccessToken {
        if !self.is_accessible(ctx, target, member, property_name) || member.is_accessible_flag() {
            return AccessToken::Unchanged;
        }
        member.elevate();
        tracing::debug!(%member, property = property_name, "elevated member access");
        AccessToken::Elevated {
            was_accessible: false,
        }
    }

    fn restore(
        &self,
        _: &EvalContext,
        target: &Value,
        member: &Member,
        property_name: &str,
        token: AccessToken,
    ) -> Result<(), AccessError> {
        match token {
            AccessToken::Unchanged => Ok(()),
            AccessToken::Elevated {
                was_accessible: false,
            } => {
                member.revoke()?;
                tracing::debug!(%member, property = property_name, "revoked member access");
                Ok(())
            }
            AccessToken::Elevated {
                was_accessible: true,
            } => Err(AccessError::ImproperRestore {
                target: target.type_name().to_string(),
                member: member.to_string(),
                property: property_name.to_string(),
            }),
        }
    }
}

/// A live elevation of one member, released by [`release`](Self::release)
/// or, failing that, on drop.
pub struct ElevationScope<'a> {
    ctx: &'a EvalContext,
    target: &'a Value,
    member: &'a Member,
    property_name: &'a str,
    token: Option<AccessToken>,
}

impl<'a> ElevationScope<'a> {
    pub fn enter(
        ctx: &'a EvalContext,
        target: &'a Value,
        member: &'a Member,
        property_name: &'a str,
    ) -> Self {
        let token = ctx.member_access().setup(ctx, target, member, property_name);
        Self {
            ctx,
            target,
            member,
            property_name,
            token: Some(token),
        }
    }

    /// Whether setup granted an elevation this scope holds.
    pub fn is_elevated(&self) -> bool {
        matches!(self.token, Some(AccessToken::Elevated { .. }))
    }

    pub fn release(mut self) -> Result<(), AccessError> {
        self.restore()
    }

    fn restore(&mut self) -> Result<(), AccessError> {
        match self.token.take() {
            Some(token) => self.ctx.member_access().restore(
                self.ctx,
                self.target,
                self.member,
                self.property_name,
                token,
            ),
            None => Ok(()),
        }
    }
}

impl Drop for ElevationScope<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(member = %self.member, error = %err, "failed to restore member access");
        }
    }
}

/// Runs `access` with `member` elevated per the context's policy.
///
/// Fails with [`EvalError::Inaccessible`] when the policy denies the member
/// or when it still cannot be accessed after setup. The elevation is always
/// released before returning; an error from `access` takes precedence over a
/// restore error.
pub(crate) fn elevated<R>(
    ctx: &EvalContext,
    target: &Value,
    member: &Member,
    property_name: &str,
    access: impl FnOnce() -> EvalResult<R>,
) -> EvalResult<R> {
    if !ctx
        .member_access()
        .is_accessible(ctx, target, member, property_name)
    {
        tracing::debug!(%member, property = property_name, "member access denied by policy");
        return Err(inaccessible(member));
    }
    if member.is_accessible_flag() {
        return access();
    }
    let scope = ElevationScope::enter(ctx, target, member, property_name);
    // another evaluation's elevation must not leak into this one
    let result = if member.is_accessible_flag() || scope.is_elevated() {
        access()
    } else {
        Err(inaccessible(member))
    };
    match (result, scope.release()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(restore_err)) => Err(restore_err.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(restore_err)) => {
            tracing::warn!(%member, error = %restore_err, "failed to restore member access");
            Err(err)
        }
    }
}

fn inaccessible(member: &Member) -> EvalError {
    EvalError::Inaccessible {
        class: member.declaring_class().to_string(),
        member: member.name().to_string(),
    }
}
