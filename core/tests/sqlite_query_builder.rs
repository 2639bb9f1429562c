#![cfg(feature = "sqlite")]

use flezy::{BindValue, Connection, FlezyError, LastResult, Operator, QueryBuilder};
use serde_json::json;
use std::time::Duration;

async fn setup() -> Connection {
    let conn = Connection::connect_url("sqlite::memory:").await.unwrap();
    let pool = conn.sqlite_pool().unwrap();
    sqlx::query(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            phone TEXT,
            password TEXT,
            score REAL
        )",
    )
    .execute(pool)
    .await
    .unwrap();
    conn
}

async fn seed(conn: &Connection) {
    let mut users = conn.table("users");
    for (name, phone) in [
        ("user1", "0000"),
        ("user2", "123456"),
        ("user3", "0000"),
        ("user4", "9123457"),
    ] {
        assert!(users
            .create([("username", name), ("phone", phone), ("password", "test123")])
            .await
            .unwrap());
    }
}

// ========== 插入与查询测试 ==========
#[tokio::test]
async fn test_create_then_all() {
    let conn = setup().await;
    seed(&conn).await;

    let rows = conn.table("users").all().await.unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["id"], json!(1));
    assert_eq!(rows[0]["username"], json!("user1"));
    assert_eq!(rows[0]["score"], json!(null));
}

#[tokio::test]
async fn test_create_with_typed_values() {
    let conn = setup().await;
    let mut users = conn.table("users");
    assert!(users
        .create([
            ("username", BindValue::from("typed")),
            ("score", BindValue::from(9.5)),
            ("phone", BindValue::Null),
        ])
        .await
        .unwrap());

    let row = users.find(1).await.unwrap().unwrap();
    assert_eq!(row["score"], json!(9.5));
    assert_eq!(row["phone"], json!(null));
    assert_eq!(users.last_result(), Some(&LastResult::Row(Some(row))));
}

#[tokio::test]
async fn test_select_columns_keep_order() {
    let conn = setup().await;
    seed(&conn).await;

    let rows = conn
        .table("users")
        .select("phone, username")
        .limit(1)
        .all()
        .await
        .unwrap();
    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["phone", "username"]);
}

// ========== WHERE 条件测试 ==========
#[tokio::test]
async fn test_second_where_replaces_first() {
    let conn = setup().await;
    seed(&conn).await;

    let rows = conn
        .table("users")
        .where_("username", "user1")
        .where_("phone", "123456")
        .all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["username"], json!("user2"));
}

#[tokio::test]
async fn test_where_op() {
    let conn = setup().await;
    seed(&conn).await;

    let rows = conn
        .table("users")
        .where_op("phone", Operator::Ne, "0000")
        .all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let rows = conn
        .table("users")
        .where_op("id", "<=".parse().unwrap(), 2)
        .all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_where_like_matches_substring() {
    let conn = setup().await;
    seed(&conn).await;

    let rows = conn
        .table("users")
        .where_like("phone", "12345")
        .all()
        .await
        .unwrap();
    let names: Vec<_> = rows.iter().map(|r| r["username"].clone()).collect();
    assert_eq!(names, vec![json!("user2"), json!("user4")]);
}

#[tokio::test]
async fn test_injection_value_is_bound() {
    let conn = setup().await;
    seed(&conn).await;

    let mut users = conn.table("users");
    let row = users
        .where_("username", "x' OR '1'='1")
        .get()
        .await
        .unwrap();
    assert!(row.is_none());
    assert_eq!(users.count_value().await.unwrap(), 0);
}

// ========== 排序与限制测试 ==========
#[tokio::test]
async fn test_order_by_desc_overrides_asc() {
    let conn = setup().await;
    seed(&conn).await;

    let row = conn
        .table("users")
        .order_by("id")
        .order_by_desc("id")
        .get()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["id"], json!(4));
}

#[tokio::test]
async fn test_limit() {
    let conn = setup().await;
    seed(&conn).await;

    let mut users = conn.table("users");
    assert_eq!(users.limit(2).all().await.unwrap().len(), 2);
    assert!(users.limit(0).all().await.unwrap().is_empty());
    assert_eq!(users.last_result(), Some(&LastResult::Rows(Vec::new())));
}

// ========== find / count 测试 ==========
#[tokio::test]
async fn test_find_ignores_where() {
    let conn = setup().await;
    seed(&conn).await;

    let mut users = conn.table("users");
    users.where_("username", "user1");
    let row = users.find(3).await.unwrap().unwrap();
    assert_eq!(row["username"], json!("user3"));
    assert!(users.find(99).await.unwrap().is_none());

    // 过滤条件仍然保留
    let rows = users.all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["username"], json!("user1"));
}

#[tokio::test]
async fn test_find_with_custom_primary_key() {
    let conn = setup().await;
    seed(&conn).await;

    let row = conn
        .table("users")
        .primary_key("username")
        .find("user2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["id"], json!(2));
}

#[tokio::test]
async fn test_count_ignores_select_and_honours_where() {
    let conn = setup().await;
    seed(&conn).await;

    let mut users = conn.table("users");
    let record = users
        .select("username")
        .where_("phone", "0000")
        .count()
        .await
        .unwrap();
    assert_eq!(record.len(), 1);
    assert_eq!(record["users_count"], json!(2));
    assert_eq!(users.count_value().await.unwrap(), 2);

    users.reset();
    assert_eq!(users.count_value().await.unwrap(), 4);
}

#[tokio::test]
async fn test_count_with_limit_zero_is_empty() {
    let conn = setup().await;
    seed(&conn).await;

    let mut users = conn.table("users");
    let record = users.limit(0).count().await.unwrap();
    assert!(record.is_empty());
    assert_eq!(users.count_value().await.unwrap(), 0);
}

// ========== 更新与删除测试 ==========
#[tokio::test]
async fn test_update_only_target_row() {
    let conn = setup().await;
    seed(&conn).await;

    let mut users = conn.table("users");
    assert!(users.update(1, [("phone", "0001")]).await.unwrap());
    assert_eq!(users.last_result(), Some(&LastResult::Affected(1)));

    let first = users.find(1).await.unwrap().unwrap();
    assert_eq!(first["phone"], json!("0001"));
    let third = users.find(3).await.unwrap().unwrap();
    assert_eq!(third["phone"], json!("0000"));

    assert!(!users.update(99, [("phone", "0002")]).await.unwrap());
}

#[tokio::test]
async fn test_update_requires_fields() {
    let conn = setup().await;
    seed(&conn).await;

    let err = conn
        .table("users")
        .update(1, Vec::<(&str, &str)>::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FlezyError::InvalidField(_)));
}

#[tokio::test]
async fn test_destroy_twice() {
    let conn = setup().await;
    seed(&conn).await;

    let mut users = conn.table("users");
    assert!(users.destroy(2).await.unwrap());
    assert!(!users.destroy(2).await.unwrap());
    assert_eq!(users.last_result(), Some(&LastResult::Affected(0)));
    assert_eq!(users.count_value().await.unwrap(), 3);
}

// ========== 错误测试 ==========
#[tokio::test]
async fn test_missing_table_sends_no_sql() {
    let conn = setup().await;
    // 已关闭的连接上仍然先返回 MissingTable
    conn.close().await;
    let mut builder = QueryBuilder::new(conn);
    let err = builder.all().await.unwrap_err();
    assert!(matches!(err, FlezyError::MissingTable));
    assert!(err.is_rejected_before_execution());
}

#[tokio::test]
async fn test_blank_table_name_is_missing_table() {
    let conn = setup().await;
    seed(&conn).await;

    let err = conn.table("").all().await.unwrap_err();
    assert!(matches!(err, FlezyError::MissingTable));

    let err = conn.table("   ").destroy(1).await.unwrap_err();
    assert!(matches!(err, FlezyError::MissingTable));

    // 没有任何行被删除
    assert_eq!(conn.table("users").count_value().await.unwrap(), 4);
}

#[tokio::test]
async fn test_invalid_identifier_rejected() {
    let conn = setup().await;
    let err = conn
        .table("users; DROP TABLE users")
        .all()
        .await
        .unwrap_err();
    assert!(matches!(err, FlezyError::InvalidIdentifier(_)));

    let err = conn
        .table("users")
        .order_by("id DESC; --")
        .all()
        .await
        .unwrap_err();
    assert!(matches!(err, FlezyError::InvalidIdentifier(_)));
}

#[tokio::test]
async fn test_unknown_table_is_execution_error() {
    let conn = setup().await;
    let err = conn.table("missing").all().await.unwrap_err();
    assert!(matches!(err, FlezyError::Execution(_)));
    assert!(!err.is_rejected_before_execution());
}

#[tokio::test]
async fn test_closed_connection_is_execution_error() {
    let conn = setup().await;
    conn.close().await;
    let err = conn.table("users").all().await.unwrap_err();
    assert!(matches!(err, FlezyError::Execution(_)));
}

// ========== 子句保留测试 ==========
#[tokio::test]
async fn test_clauses_persist_across_terminal_calls() {
    let conn = setup().await;
    seed(&conn).await;

    let mut users = conn.table("users");
    users.where_("phone", "0000");
    assert_eq!(users.all().await.unwrap().len(), 2);
    assert_eq!(users.all().await.unwrap().len(), 2);

    users.table("users");
    assert_eq!(users.all().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_timeout_allows_fast_statement() {
    let conn = setup().await;
    seed(&conn).await;

    let rows = conn
        .table("users")
        .timeout(Duration::from_secs(5))
        .all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
}
