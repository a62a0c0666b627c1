//! Permission rules of the Todo API.

use crate::rule::{
    is_admin, is_authenticated, is_entity_owner, is_node_owner, is_owner_of_arg_id,
    is_owner_of_parent_field, Rule,
};
use crate::tree::RuleTree;
use crate::types::FieldKey;
use relay::EntityType;

/// Every field the API exposes, as `(type, field)`.
pub const SCHEMA_FIELDS: &[(&str, &str)] = &[
    ("Query", "health"),
    ("Query", "me"),
    ("Query", "node"),
    ("Query", "todo"),
    ("Query", "todos"),
    ("Query", "user"),
    ("Query", "users"),
    ("User", "email"),
    ("User", "todos"),
    ("Mutation", "createTodo"),
    ("Mutation", "updateTodo"),
    ("Mutation", "completeTodo"),
    ("Mutation", "uncompleteTodo"),
    ("Mutation", "deleteTodo"),
    ("Mutation", "updateMe"),
    ("Mutation", "deleteUser"),
];

pub fn schema_fields() -> Vec<FieldKey> {
    SCHEMA_FIELDS
        .iter()
        .map(|(type_name, field_name)| FieldKey::new(*type_name, *field_name))
        .collect()
}

fn admin_or_todo_owner() -> Rule {
    Rule::race([is_admin(), is_entity_owner("id", EntityType::Todo)])
}

fn admin_or_parent_owner() -> Rule {
    Rule::race([is_admin(), is_owner_of_parent_field("id")])
}

/// The rule tree for the Todo API. Unlisted fields are denied.
pub fn todo_permissions() -> RuleTree {
    RuleTree::builder()
        .field("Query", "health", Rule::Allow)
        .field("Query", "me", is_authenticated())
        .field(
            "Query",
            "node",
            Rule::chain([
                is_authenticated(),
                Rule::race([is_admin(), is_node_owner("id")]),
            ]),
        )
        .field("Query", "todo", admin_or_todo_owner())
        .field("Query", "todos", is_authenticated())
        .field(
            "Query",
            "user",
            Rule::race([is_admin(), is_owner_of_arg_id("id")]),
        )
        .field("Query", "users", is_admin())
        .field("User", "email", admin_or_parent_owner())
        .field("User", "todos", admin_or_parent_owner())
        .field("Mutation", "createTodo", is_authenticated())
        .field("Mutation", "updateTodo", admin_or_todo_owner())
        .field("Mutation", "completeTodo", admin_or_todo_owner())
        .field("Mutation", "uncompleteTodo", admin_or_todo_owner())
        .field("Mutation", "deleteTodo", admin_or_todo_owner())
        .field("Mutation", "updateMe", is_authenticated())
        .field("Mutation", "deleteUser", is_admin())
        .fallback(Rule::Deny)
        .build()
}
