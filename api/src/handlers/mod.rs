//! Route handlers. Each handler serves one schema field and resolves it
//! through the [`PermissionMiddleware`].

pub mod health;
pub mod me;
pub mod node;
pub mod todos;
pub mod users;

use authz::{Args, FieldKey};
use relay::{ConnectionArgs, KeyCursor, PaginationArgs, PaginationLimits};
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult},
    middleware_hooks::PermissionMiddleware,
    models::UserNode,
};

/// Field arguments carrying a single `id`.
pub(crate) fn id_args(id: &str) -> Args {
    let mut args = Args::new();
    args.insert("id".to_string(), Value::String(id.to_string()));
    args
}

/// Field arguments of a list field.
pub(crate) fn connection_field_args(args: &ConnectionArgs) -> Args {
    match serde_json::to_value(args) {
        Ok(Value::Object(map)) => map,
        _ => Args::new(),
    }
}

pub(crate) fn parse_pagination(
    args: &ConnectionArgs,
    limits: PaginationLimits,
) -> ApiResult<PaginationArgs<String>> {
    Ok(relay::parse(args, limits, KeyCursor::decode)?)
}

/// Serialised user row, the parent object for `User.*` field rules.
pub(crate) fn user_parent(user: &database::User) -> ApiResult<Value> {
    serde_json::to_value(user).map_err(|e| ApiError::Internal(e.to_string()))
}

/// Builds the client view of a user, hiding `email` unless `User.email`
/// allows it.
pub(crate) async fn user_node(
    mw: &PermissionMiddleware<'_>,
    user: database::User,
) -> ApiResult<UserNode> {
    let parent = user_parent(&user)?;
    let email = mw
        .resolve_nullable(
            &FieldKey::new("User", "email"),
            &Args::new(),
            Some(&parent),
            || async { Ok(user.email.clone()) },
        )
        .await?;
    Ok(UserNode::new(user, email))
}
