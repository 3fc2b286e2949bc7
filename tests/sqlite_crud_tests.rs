mod support;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crudsql::{Crud, CrudConfig, CrudError, Dialect, Params, SqlBuilder};
use support::{ByAge, ByNickname, Contact, Document, SCHEMA, SqliteExecutor, Tag, User};
use uuid::Uuid;

fn sqlite_builder() -> Arc<SqlBuilder> {
    Arc::new(CrudConfig::new(Dialect::Sqlite).build())
}

fn crud() -> Crud<SqliteExecutor> {
    Crud::with_builder(SqliteExecutor::open(SCHEMA), sqlite_builder())
}

async fn seed_users(crud: &mut Crud<SqliteExecutor>, count: i32) {
    for i in 1..=count {
        let mut user = User::new(&format!("user{:02}", i), 20 + i);
        crud.insert::<i64, User>(&mut user).await.unwrap();
    }
}

#[tokio::test]
async fn test_user_lifecycle() {
    let mut crud = crud();

    let mut user = User::new("Alice", 30);
    let id = crud.insert::<i64, User>(&mut user).await.unwrap();
    assert_eq!(id, 1);
    assert_eq!(user.id, 1);

    let fetched = crud.get::<User>(id).await.unwrap();
    assert_eq!(fetched, Some(user.clone()));

    user.age = 31;
    assert_eq!(crud.update(&user).await.unwrap(), 1);
    assert_eq!(crud.record_count::<User, _>(&ByAge { age: 31 }).await.unwrap(), 1);
    assert_eq!(crud.record_count::<User, _>(&ByAge { age: 30 }).await.unwrap(), 0);

    assert_eq!(crud.delete_by_id::<User>(id).await.unwrap(), 1);
    assert_eq!(crud.get::<User>(id).await.unwrap(), None);
}

#[tokio::test]
async fn test_generated_key_fetched_in_insert_batch() {
    let mut crud = crud();

    let mut user = User::new("Eve", 28);
    let id = crud.insert::<i64, User>(&mut user).await.unwrap();
    assert_eq!(user.id, id);
    assert_eq!(
        crud.executor().statements,
        vec![
            "INSERT INTO \"Users\" (\"name\", \"age\") VALUES (@name, @age);SELECT LAST_INSERT_ROWID() AS id"
                .to_string()
        ]
    );

    let mut second = User::new("Finn", 33);
    let second_id = crud.insert::<i64, User>(&mut second).await.unwrap();
    assert_eq!(second_id, id + 1);
    assert_eq!(crud.executor().statements.len(), 2);
}

#[tokio::test]
async fn test_text_keys_are_inserted() {
    let mut crud = crud();

    let mut tag = Tag {
        id: "o'brien".into(),
        label: "Irish".into(),
    };
    let id = crud.insert::<String, Tag>(&mut tag).await.unwrap();
    assert_eq!(id, "o'brien");
    assert_eq!(crud.executor().statements.len(), 1);

    let stored = crud.get::<Tag>("o'brien").await.unwrap().unwrap();
    assert_eq!(stored, tag);
}

#[tokio::test]
async fn test_insert_preserves_fields() {
    let mut crud = crud();

    let mut bob = User::new("Bob", 44);
    let id = crud.insert::<i64, User>(&mut bob).await.unwrap();
    let stored = crud.get::<User>(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Bob");
    assert_eq!(stored.age, 44);

    assert_eq!(crud.delete(&stored).await.unwrap(), 1);
    assert_eq!(crud.record_count_where::<User>("", Params::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_pages_are_disjoint() {
    let mut crud = crud();
    seed_users(&mut crud, 25).await;

    let first = crud
        .get_list_paged::<User>(1, 10, "", "", Params::new())
        .await
        .unwrap();
    let second = crud
        .get_list_paged::<User>(2, 10, "", "", Params::new())
        .await
        .unwrap();
    let third = crud
        .get_list_paged::<User>(3, 10, "", "", Params::new())
        .await
        .unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);
    assert_eq!(third.len(), 5);

    let ids: HashSet<i64> = first.iter().chain(second.iter()).map(|user| user.id).collect();
    assert_eq!(ids, (1..=20).collect::<HashSet<i64>>());
    assert_eq!(first.last().map(|user| user.id), Some(10));
    assert_eq!(second.first().map(|user| user.id), Some(11));
}

#[tokio::test]
async fn test_paged_with_conditions_and_order() {
    let mut crud = crud();
    seed_users(&mut crud, 12).await;

    let page = crud
        .get_list_paged::<User>(
            1,
            3,
            "WHERE age >= @min_age",
            "age DESC",
            Params::new().with("min_age", 28),
        )
        .await
        .unwrap();
    let ages: Vec<i32> = page.iter().map(|user| user.age).collect();
    assert_eq!(ages, vec![32, 31, 30]);
}

#[tokio::test]
async fn test_list_filters() {
    let mut crud = crud();
    seed_users(&mut crud, 5).await;

    let all = crud.get_all::<User>().await.unwrap();
    assert_eq!(all.len(), 5);

    let matched = crud.get_list::<User, _>(&ByAge { age: 23 }).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name, "user03");

    let older = crud
        .get_list_where::<User>("WHERE age > @age ORDER BY id", Params::new().with("age", 23))
        .await
        .unwrap();
    assert_eq!(
        older.iter().map(|user| user.id).collect::<Vec<_>>(),
        vec![4, 5]
    );
}

#[tokio::test]
async fn test_null_filter_matches_missing_values() {
    let mut crud = crud();

    for (name, nickname) in [("Ann", None), ("Ben", Some("benny")), ("Cid", None)] {
        let mut contact = Contact {
            name: name.into(),
            nickname: nickname.map(String::from),
            ..Contact::default()
        };
        crud.insert::<i64, Contact>(&mut contact).await.unwrap();
    }

    let without = crud
        .record_count::<Contact, _>(&ByNickname { nickname: None })
        .await
        .unwrap();
    assert_eq!(without, 2);

    let benny = crud
        .get_list::<Contact, _>(&ByNickname {
            nickname: Some("benny".into()),
        })
        .await
        .unwrap();
    assert_eq!(benny.len(), 1);
    assert_eq!(benny[0].name, "Ben");

    assert_eq!(
        crud.delete_list::<Contact, _>(&ByNickname { nickname: None })
            .await
            .unwrap(),
        2
    );
    assert_eq!(crud.get_all::<Contact>().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_uuid_keys() {
    let mut crud = crud();

    let mut document = Document {
        title: "Roadmap".into(),
        ..Document::default()
    };
    let id = crud.insert::<Uuid, Document>(&mut document).await.unwrap();
    assert!(!id.is_nil());
    assert_eq!(id, document.id);

    let stored = crud.get::<Document>(id).await.unwrap().unwrap();
    assert_eq!(stored, document);

    let mut preset = Document {
        id: Uuid::new_v4(),
        title: "Preset".into(),
    };
    let preset_id = crud.insert::<Uuid, Document>(&mut preset).await.unwrap();
    assert_eq!(preset_id, preset.id);
    assert_eq!(crud.record_count::<Document, _>(&()).await.unwrap(), 2);
}

#[tokio::test]
async fn test_delete_list_where_guard_runs_nothing() {
    let mut crud = crud();
    seed_users(&mut crud, 3).await;
    let executed = crud.executor().statements.len();

    let err = crud
        .delete_list_where::<User>("", Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CrudError::DeleteListRequiresWhere));
    assert_eq!(crud.executor().statements.len(), executed);
    assert_eq!(crud.record_count::<User, _>(&()).await.unwrap(), 3);

    let deleted = crud
        .delete_list_where::<User>("WHERE age < @age", Params::new().with("age", 23))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
}

#[tokio::test]
async fn test_execution_errors_propagate() {
    let mut crud = Crud::with_builder(SqliteExecutor::open(""), sqlite_builder());

    let err = crud.get_all::<User>().await.unwrap_err();
    assert!(matches!(err, CrudError::Execution(_)));
    assert!(!err.is_configuration());
}

#[tokio::test]
async fn test_command_timeouts() {
    let builder = Arc::new(
        CrudConfig::new(Dialect::Sqlite)
            .command_timeout(Duration::from_secs(30))
            .build(),
    );

    let mut crud = Crud::with_builder(SqliteExecutor::open(SCHEMA), builder.clone());
    crud.get_all::<User>().await.unwrap();
    assert_eq!(crud.executor().last_timeout, Some(Duration::from_secs(30)));

    let mut crud =
        Crud::with_builder(SqliteExecutor::open(SCHEMA), builder).with_timeout(Duration::from_secs(2));
    crud.get_all::<User>().await.unwrap();
    assert_eq!(crud.executor().last_timeout, Some(Duration::from_secs(2)));
}

#[tokio::test]
async fn test_borrowed_executor() {
    let mut executor = SqliteExecutor::open(SCHEMA);
    {
        let mut crud = Crud::with_builder(&mut executor, sqlite_builder());
        let mut user = User::new("Dora", 52);
        crud.insert::<i64, User>(&mut user).await.unwrap();
    }

    let count: i64 = executor
        .connection()
        .query_row("SELECT COUNT(*) FROM Users", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
