//! Development seed data: three users with well-known bearer tokens and a
//! few todos each.

use authz::Role;
use database::{DatabaseError, NewTodo, NewUser, User};
use tracing::info;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

/// The users created by [`init_test_data`].
#[derive(Debug, Clone)]
pub struct SeedData {
    pub admin: User,
    pub alice: User,
    pub bob: User,
}

/// Generate the seed users with their tokens
pub fn generate_user_test_data() -> Vec<(NewUser, &'static str)> {
    vec![
        (
            NewUser {
                name: "Ada Admin".to_string(),
                email: "admin@example.com".to_string(),
                role: Role::Admin,
            },
            ADMIN_TOKEN,
        ),
        (
            NewUser {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                role: Role::User,
            },
            ALICE_TOKEN,
        ),
        (
            NewUser {
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
                role: Role::User,
            },
            BOB_TOKEN,
        ),
    ]
}

/// Todo titles per seed user, in the order of [`generate_user_test_data`]
pub fn generate_todo_test_data() -> Vec<Vec<&'static str>> {
    vec![
        vec!["Review access logs"],
        vec![
            "Buy oat milk",
            "Book dentist appointment",
            "Water the plants",
            "Renew passport",
        ],
        vec!["Fix the bike chain", "Call grandma"],
    ]
}

/// Initialize test data in the database (only if there are no users yet)
pub async fn init_test_data(db: &database::Database) -> Result<Option<SeedData>, DatabaseError> {
    if db.users().count().await? > 0 {
        info!("Database already contains users, skipping test data initialization");
        return Ok(None);
    }

    info!("Database is empty, initializing test data");

    let mut users = Vec::new();
    for ((new_user, token), titles) in generate_user_test_data()
        .into_iter()
        .zip(generate_todo_test_data())
    {
        let user = db.users().create(new_user).await?;
        db.tokens().insert(token, &user.id).await?;
        for title in &titles {
            db.todos()
                .create(
                    &user.id,
                    NewTodo {
                        title: title.to_string(),
                    },
                )
                .await?;
        }
        info!(
            "Created test user {} ({}) with {} todos",
            user.name,
            user.id,
            titles.len()
        );
        users.push(user);
    }

    let mut users = users.into_iter();
    match (users.next(), users.next(), users.next()) {
        (Some(admin), Some(alice), Some(bob)) => {
            info!("Test data initialization complete");
            Ok(Some(SeedData { admin, alice, bob }))
        }
        _ => Err(DatabaseError::Other(
            "seed users were not all created".to_string(),
        )),
    }
}
