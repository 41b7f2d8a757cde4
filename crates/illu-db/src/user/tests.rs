use super::*;
use crate::config::{DangerousDmlPolicy, SqlPolicy};
use crate::error::DbError;
use crate::testing::{FakeExecutor, Reply};

fn user_row(id: i64, user_name: &str, org_id: Option<i64>) -> Record {
    Record::new()
        .with("id", id)
        .with("phone_prefix", "+1")
        .with("phone", "5550100")
        .with("user_name", user_name)
        .with("org_id", org_id)
}

fn alice() -> NewUser {
    NewUser::new("+1", "5550100", "alice", "argon2$hash")
}

#[tokio::test]
async fn create_binds_null_for_unset_optional_columns() {
    let fake = FakeExecutor::new()
        .reply(Reply::Affected(1))
        .reply(Reply::Rows(vec![user_row(10, "alice", None)]));
    let store = Store::new(fake);

    let user = store.create_user(&alice()).await.unwrap().unwrap();
    assert_eq!(user.id, 10);
    assert_eq!(user.org_id, None);

    let calls = store.executor().calls();
    assert_eq!(calls[0].0, INSERT_USER);
    assert_eq!(calls[0].1.get("jwt"), Some(&SqlValue::Null));
    assert_eq!(calls[0].1.get("org_id"), Some(&SqlValue::Null));
    assert_eq!(calls[0].1.len(), 6);
}

#[tokio::test]
async fn create_fetches_non_secret_columns_by_phone() {
    let fake = FakeExecutor::new()
        .reply(Reply::Affected(1))
        .reply(Reply::Rows(vec![user_row(10, "alice", Some(2))]));
    let store = Store::new(fake);

    let user = store
        .create_user(&alice().jwt("token").org_id(2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.org_id, Some(2));

    let calls = store.executor().calls();
    assert_eq!(calls[0].1.get("jwt"), Some(&SqlValue::from("token")));
    assert_eq!(
        calls[1].0,
        "SELECT id, phone_prefix, phone, user_name, org_id FROM my_schema.illu_user \
         WHERE phone_prefix=%(phone_prefix)s AND phone=%(phone)s"
    );
    assert!(!calls[1].0.contains("pw_hash"));
}

#[tokio::test]
async fn create_duplicate_phone_returns_none() {
    let store = Store::new(
        FakeExecutor::new().reply(Reply::Fail(DbError::UniqueViolation("illu_user_phone".into()))),
    );
    assert_eq!(store.create_user(&alice()).await.unwrap(), None);
}

#[tokio::test]
async fn create_missing_org_propagates_foreign_key_error() {
    let store = Store::new(
        FakeExecutor::new().reply(Reply::Fail(DbError::ForeignKeyViolation("org_id".into()))),
    );
    let err = store.create_user(&alice().org_id(99)).await.unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation(_)));
}

#[tokio::test]
async fn get_users_by_org() {
    let fake = FakeExecutor::new().reply(Reply::Rows(vec![
        user_row(10, "alice", Some(2)),
        user_row(11, "bob", Some(2)),
    ]));
    let store = Store::new(fake);

    let users = store.get_users(&UserFilter::new().org_id(2)).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].user_name, "bob");

    let calls = store.executor().calls();
    assert_eq!(
        calls[0].0,
        "SELECT id, phone_prefix, phone, user_name, org_id FROM my_schema.illu_user \
         WHERE org_id=%(org_id)s"
    );
}

#[tokio::test]
async fn get_users_filter_order_follows_columns() {
    let store = Store::new(FakeExecutor::new());
    let filter = UserFilter::new().user_name("alice").phone("+1", "5550100");
    store.get_users(&filter).await.unwrap();

    let calls = store.executor().calls();
    assert!(calls[0].0.ends_with(
        "WHERE phone_prefix=%(phone_prefix)s AND phone=%(phone)s AND user_name=%(user_name)s"
    ));
    assert_eq!(calls[0].1.len(), 3);
}

#[tokio::test]
async fn update_moves_phone_number() {
    let store = Store::new(FakeExecutor::new());
    let changes = UserChanges::new().new_phone("+44", "7700900");

    assert_eq!(store.update_user("+1", "5550100", &changes).await.unwrap(), 1);

    let calls = store.executor().calls();
    assert_eq!(
        calls[0].0,
        "UPDATE my_schema.illu_user SET phone_prefix=%(new_phone_prefix)s, phone=%(phone)s \
         WHERE phone_prefix=%(old_phone_prefix)s AND phone=%(old_phone)s"
    );
    assert_eq!(
        calls[0].1,
        ParamMap::new()
            .with("new_phone_prefix", "+44")
            .with("phone", "7700900")
            .with("old_phone_prefix", "+1")
            .with("old_phone", "5550100")
    );
}

#[tokio::test]
async fn update_secrets_only() {
    let store = Store::new(FakeExecutor::new());
    let changes = UserChanges::new().pw_hash("argon2$new").jwt("fresh");

    store.update_user("+1", "5550100", &changes).await.unwrap();

    let calls = store.executor().calls();
    assert!(calls[0].0.starts_with(
        "UPDATE my_schema.illu_user SET pw_hash=%(pw_hash)s, jwt=%(jwt)s WHERE"
    ));
}

#[tokio::test]
async fn update_with_nothing_to_set_skips_the_query() {
    let store = Store::with_policy(
        FakeExecutor::new(),
        SqlPolicy::new().update_without_where(DangerousDmlPolicy::Error),
    );
    assert_eq!(
        store
            .update_user("+1", "5550100", &UserChanges::new())
            .await
            .unwrap(),
        0
    );
    assert!(store.executor().calls().is_empty());
}

#[tokio::test]
async fn delete_by_phone() {
    let store = Store::new(FakeExecutor::new().reply(Reply::Affected(0)));
    assert_eq!(store.delete_user("+1", "5550100").await.unwrap(), 0);

    let calls = store.executor().calls();
    assert_eq!(calls[0].0, DELETE_USER);
    assert_eq!(
        calls[0].1,
        ParamMap::new().with("phone_prefix", "+1").with("phone", "5550100")
    );
}
