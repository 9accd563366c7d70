//! Generic SQL engine against a real PostgreSQL database.
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use sqlx::PgPool;
use table_admin::{
    ColumnDefinition, ColumnType, ColumnTypeRegistry, DataAccessError, DbValue, FormPostEntry, GenericSqlDao,
    PgSchemaProvider, Resource, ResourceConfig, ResourceFileConfig, ResourceRegistry, SchemaProvider,
};

static NEXT: AtomicUsize = AtomicUsize::new(0);

async fn connect() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("Skipping PostgreSQL test - set DATABASE_URL to enable");
        return None;
    };
    Some(PgPool::connect(&url).await.expect("connect"))
}

/// Fresh `locations` style table with a unique name.
async fn create_table(pool: &PgPool) -> String {
    let table = format!("locations_it_{}_{}", std::process::id(), NEXT.fetch_add(1, Ordering::SeqCst));
    sqlx::query(&format!(
        "CREATE TABLE \"{}\" (
            id serial PRIMARY KEY,
            name varchar(40) NOT NULL,
            favorite_number int4,
            created timestamp,
            active boolean NOT NULL DEFAULT false,
            notes text
        )",
        table
    ))
    .execute(pool)
    .await
    .expect("create table");
    table
}

async fn drop_table(pool: &PgPool, table: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\"", table))
        .execute(pool)
        .await
        .expect("drop table");
}

async fn resource(pool: &PgPool, table: &str) -> Resource {
    let provider = PgSchemaProvider::new(pool.clone(), table, ColumnTypeRegistry::default());
    let columns = provider.column_definitions().await.expect("introspect");
    let pool = pool.clone();
    Resource::build(table, columns, ResourceConfig::default(), move |schema| {
        Arc::new(GenericSqlDao::new(pool, schema))
    })
    .expect("build resource")
}

fn entry(resource: &Resource, pairs: &[(&str, &str)]) -> FormPostEntry {
    let mut e = FormPostEntry::new(resource.schema().clone());
    for (k, v) in pairs {
        e.set(k, *v).unwrap();
    }
    e
}

#[tokio::test]
#[ignore]
async fn introspection_canonicalizes_and_finds_keys() {
    let Some(pool) = connect().await else { return };
    let table = create_table(&pool).await;
    let provider = PgSchemaProvider::new(pool.clone(), table.as_str(), ColumnTypeRegistry::default());
    let columns = provider.column_definitions().await.unwrap();
    let types: Vec<_> = columns.iter().map(|c| (c.name.as_str(), c.column_type)).collect();
    assert_eq!(
        types,
        vec![
            ("id", ColumnType::Integer),
            ("name", ColumnType::String),
            ("favorite_number", ColumnType::Integer),
            ("created", ColumnType::Datetime),
            ("active", ColumnType::Boolean),
            ("notes", ColumnType::Text),
        ]
    );
    let keys = provider.key_columns().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].name, "id");

    let missing = PgSchemaProvider::new(pool.clone(), "no_such_table_here", ColumnTypeRegistry::default());
    assert!(matches!(
        missing.column_definitions().await,
        Err(DataAccessError::TableNotFound(_))
    ));
    drop_table(&pool, &table).await;
}

#[tokio::test]
#[ignore]
async fn insert_select_update_delete() {
    let Some(pool) = connect().await else { return };
    let table = create_table(&pool).await;
    let r = resource(&pool, &table).await;
    let dao = r.dao();

    dao.insert(&entry(
        &r,
        &[
            ("name", "Lab"),
            ("favorite_number", "042"),
            ("created", "2024-01-02 03:04:05"),
            ("active", "true"),
        ],
    ))
    .await
    .unwrap();
    assert_eq!(dao.count().await.unwrap(), 1);

    let row = dao.select_one(&["1".to_string()]).await.unwrap().unwrap();
    assert_eq!(row.get("favorite_number"), Some(&DbValue::Integer(42)));
    assert_eq!(row.get("active"), Some(&DbValue::Boolean(true)));
    assert_eq!(row.get("created").unwrap().to_string(), "2024-01-02 03:04:05");
    assert_eq!(row.get("notes"), Some(&DbValue::Null));

    dao.update(&entry(&r, &[("id", "1"), ("name", "Annex")])).await.unwrap();
    let row = dao.select_one(&["1".to_string()]).await.unwrap().unwrap();
    assert_eq!(row.get("name"), Some(&DbValue::Text("Annex".into())));
    assert_eq!(row.get("favorite_number"), Some(&DbValue::Integer(42)));

    let err = dao
        .update(&entry(&r, &[("id", "99"), ("name", "Ghost")]))
        .await
        .unwrap_err();
    assert!(matches!(err, DataAccessError::UnexpectedRowCount { actual: 0 }));

    dao.delete(&["1".to_string()]).await.unwrap();
    assert!(dao.select_one(&["1".to_string()]).await.unwrap().is_none());
    drop_table(&pool, &table).await;
}

#[tokio::test]
#[ignore]
async fn select_multiple_sorts_and_pages() {
    let Some(pool) = connect().await else { return };
    let table = create_table(&pool).await;
    let r = resource(&pool, &table).await;
    for (name, n) in [("a", "3"), ("b", "10"), ("c", "1")] {
        r.dao()
            .insert(&entry(&r, &[("name", name), ("favorite_number", n)]))
            .await
            .unwrap();
    }
    let rows = r.dao().select_multiple(0, 2, "favorite_number", false).await.unwrap();
    let names: Vec<_> = rows.iter().map(|row| row.get("name").unwrap().to_string()).collect();
    assert_eq!(names, vec!["b", "a"]);

    let rows = r.dao().select_multiple(2, 2, "favorite_number", false).await.unwrap();
    assert_eq!(rows.len(), 1);
    drop_table(&pool, &table).await;
}

#[tokio::test]
#[ignore]
async fn table_names_match_case_insensitively() {
    let Some(pool) = connect().await else { return };
    let table = create_table(&pool).await;
    let provider = PgSchemaProvider::new(pool.clone(), table.to_uppercase(), ColumnTypeRegistry::default());
    assert_eq!(provider.table_name().await.unwrap(), table);
    assert_eq!(provider.column_definitions().await.unwrap().len(), 6);

    let files: Vec<ResourceFileConfig> =
        vec![serde_json::from_value(serde_json::json!({ "table": table.to_uppercase() })).unwrap()];
    let registry = ResourceRegistry::load_postgres(&pool, &ColumnTypeRegistry::default(), &files)
        .await
        .unwrap();
    let r = registry.resource(&table).expect("registered under the catalog name");
    r.dao().insert(&entry(r, &[("name", "Lab")])).await.unwrap();
    assert_eq!(r.dao().count().await.unwrap(), 1);
    drop_table(&pool, &table).await;
}

#[tokio::test]
#[ignore]
async fn mixed_case_table_is_quoted_as_the_catalog_spells_it() {
    let Some(pool) = connect().await else { return };
    let table = format!("Mixed_It_{}_{}", std::process::id(), NEXT.fetch_add(1, Ordering::SeqCst));
    sqlx::query(&format!("CREATE TABLE \"{}\" (id serial PRIMARY KEY, label text)", table))
        .execute(&pool)
        .await
        .expect("create table");

    let provider = PgSchemaProvider::new(pool.clone(), table.to_lowercase(), ColumnTypeRegistry::default());
    let name = provider.table_name().await.unwrap();
    assert_eq!(name, table);
    let columns = provider.column_definitions().await.unwrap();
    let pool2 = pool.clone();
    let r = Resource::build(&name, columns, ResourceConfig::default(), move |schema| {
        Arc::new(GenericSqlDao::new(pool2, schema))
    })
    .unwrap();
    r.dao().insert(&entry(&r, &[("label", "a")])).await.unwrap();
    let row = r.dao().select_one(&["1".to_string()]).await.unwrap().unwrap();
    assert_eq!(row.get("label"), Some(&DbValue::Text("a".into())));
    drop_table(&pool, &table).await;
}

#[tokio::test]
#[ignore]
async fn update_matching_several_rows_fails() {
    let Some(pool) = connect().await else { return };
    let table = format!("groups_it_{}_{}", std::process::id(), NEXT.fetch_add(1, Ordering::SeqCst));
    sqlx::query(&format!("CREATE TABLE \"{}\" (grp int4, label text)", table))
        .execute(&pool)
        .await
        .expect("create table");
    sqlx::query(&format!("INSERT INTO \"{}\" (grp, label) VALUES (1, 'a'), (1, 'b')", table))
        .execute(&pool)
        .await
        .expect("seed rows");

    let columns = vec![
        ColumnDefinition::key("grp", ColumnType::Integer),
        ColumnDefinition::new("label", ColumnType::Text),
    ];
    let pool2 = pool.clone();
    let r = Resource::build(&table, columns, ResourceConfig::default(), move |schema| {
        Arc::new(GenericSqlDao::new(pool2, schema))
    })
    .unwrap();
    let err = r
        .dao()
        .update(&entry(&r, &[("grp", "1"), ("label", "c")]))
        .await
        .unwrap_err();
    assert!(matches!(err, DataAccessError::UnexpectedRowCount { actual: 2 }));
    drop_table(&pool, &table).await;
}

#[tokio::test]
#[ignore]
async fn bit_columns_read_and_write_as_booleans() {
    let Some(pool) = connect().await else { return };
    let table = format!("flags_it_{}_{}", std::process::id(), NEXT.fetch_add(1, Ordering::SeqCst));
    sqlx::query(&format!("CREATE TABLE \"{}\" (id serial PRIMARY KEY, flag bit)", table))
        .execute(&pool)
        .await
        .expect("create table");
    let r = resource(&pool, &table).await;
    assert_eq!(r.column("flag").unwrap().column_type, ColumnType::Boolean);

    r.dao().insert(&entry(&r, &[("flag", "true")])).await.unwrap();
    r.dao().insert(&entry(&r, &[("flag", "")])).await.unwrap();
    let row = r.dao().select_one(&["1".to_string()]).await.unwrap().unwrap();
    assert_eq!(row.get("flag"), Some(&DbValue::Boolean(true)));
    let row = r.dao().select_one(&["2".to_string()]).await.unwrap().unwrap();
    assert_eq!(row.get("flag"), Some(&DbValue::Null));

    r.dao().update(&entry(&r, &[("id", "1"), ("flag", "false")])).await.unwrap();
    let row = r.dao().select_one(&["1".to_string()]).await.unwrap().unwrap();
    assert_eq!(row.get("flag"), Some(&DbValue::Boolean(false)));
    drop_table(&pool, &table).await;
}
