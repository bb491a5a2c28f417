// ==========================================
// 人道反馈看板 - 反馈条目仓储
// ==========================================
// 职责: 管理 feedback_item / item_term 表,提供创建与打标接口
// 约束: (body, timestamp) 为自然键,重复创建返回唯一约束错误
// 说明: 字段长度等校验在写入前完成,错误按字段逐条返回
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::item::{FeedbackItem, FieldValue, TermRef};
use crate::domain::taxonomy::{Multiplicity, TermCount};
use crate::i18n::{t, t_with_args};
use crate::repository::error::{FieldError, RepositoryError, RepositoryResult};
use crate::repository::taxonomy_repo::{insert_term, query_taxonomy, query_term_id};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 条目文本字段及最大长度（None 表示不限）
pub const TEXT_FIELDS: &[(&str, Option<usize>)] = &[
    ("body", None),
    ("translation", None),
    ("network_provider", Some(190)),
    ("location", Some(100)),
    ("sub_location", Some(100)),
    ("language", Some(190)),
    ("risk", Some(30)),
    ("gender", Some(100)),
    ("age", Some(100)),
    ("contributor", Some(190)),
    ("collection_type", Some(190)),
    ("external_id", Some(80)),
];

pub const TIMESTAMP_FIELD: &str = "timestamp";

// ==========================================
// ItemStore Trait
// ==========================================
pub trait ItemStore {
    /// 创建条目
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 自然键已存在
    /// - Err(ValidationError): 字段校验失败
    fn create_item(&self, fields: &BTreeMap<String, FieldValue>) -> RepositoryResult<FeedbackItem>;

    /// 为条目挂接同一分类下的一个或多个词条
    ///
    /// # 返回
    /// - Err(TermRejected): 分类不存在 / 封闭词表无此词条 / optional 分类给出多个词条
    fn add_terms(&self, item_id: i64, taxonomy: &str, names: &[String]) -> RepositoryResult<FeedbackItem>;
}

impl<T: ItemStore + ?Sized> ItemStore for &T {
    fn create_item(&self, fields: &BTreeMap<String, FieldValue>) -> RepositoryResult<FeedbackItem> {
        (**self).create_item(fields)
    }

    fn add_terms(&self, item_id: i64, taxonomy: &str, names: &[String]) -> RepositoryResult<FeedbackItem> {
        (**self).add_terms(item_id, taxonomy, names)
    }
}

impl<T: ItemStore + ?Sized> ItemStore for Arc<T> {
    fn create_item(&self, fields: &BTreeMap<String, FieldValue>) -> RepositoryResult<FeedbackItem> {
        (**self).create_item(fields)
    }

    fn add_terms(&self, item_id: i64, taxonomy: &str, names: &[String]) -> RepositoryResult<FeedbackItem> {
        (**self).add_terms(item_id, taxonomy, names)
    }
}

// ==========================================
// 写入前校验
// ==========================================

/// 校验通过的条目字段
struct ValidatedItem {
    text: BTreeMap<&'static str, String>,
    // None: 未提供（取当前时间）；Some(None): 显式为空
    timestamp: Option<Option<DateTime<Utc>>>,
}

impl ValidatedItem {
    fn text(&self, field: &str) -> &str {
        self.text.get(field).map(String::as_str).unwrap_or("")
    }
}

fn field_error(field: &str, code: &str, message: String, value: &FieldValue) -> FieldError {
    FieldError {
        field: field.to_string(),
        code: code.to_string(),
        message,
        value: value.to_string(),
    }
}

fn validate(fields: &BTreeMap<String, FieldValue>) -> RepositoryResult<ValidatedItem> {
    let mut errors = Vec::new();
    let mut text = BTreeMap::new();
    let mut timestamp = None;

    for (field, value) in fields {
        if field == TIMESTAMP_FIELD {
            match value {
                FieldValue::Date(dt) => timestamp = Some(dt.map(|d| d.with_timezone(&Utc))),
                FieldValue::Text(s) if s.is_empty() => timestamp = Some(None),
                FieldValue::Text(s) => match DateTime::parse_from_rfc3339(s) {
                    Ok(dt) => timestamp = Some(Some(dt.with_timezone(&Utc))),
                    Err(_) => errors.push(field_error(field, "invalid", t("store.invalid_datetime"), value)),
                },
                _ => errors.push(field_error(field, "invalid", t("store.invalid_datetime"), value)),
            }
            continue;
        }

        let Some((name, max_length)) = TEXT_FIELDS.iter().find(|(name, _)| *name == field.as_str()) else {
            tracing::debug!(field = %field, "忽略未知字段");
            continue;
        };

        let rendered = value.to_string();
        if let Some(max) = max_length {
            if rendered.chars().count() > *max {
                errors.push(field_error(
                    field,
                    "max_length",
                    t_with_args("store.max_length", &[("max", &max.to_string())]),
                    value,
                ));
            }
        }
        text.insert(*name, rendered);
    }

    match text.get("body") {
        None => errors.push(field_error("body", "required", t("store.required"), &FieldValue::from(""))),
        Some(body) if body.is_empty() => {
            errors.push(field_error("body", "blank", t("store.blank"), &FieldValue::from("")))
        }
        Some(_) => {}
    }

    if errors.is_empty() {
        Ok(ValidatedItem { text, timestamp })
    } else {
        Err(RepositoryError::ValidationError { errors })
    }
}

// ==========================================
// SqliteItemStore
// ==========================================
pub struct SqliteItemStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteItemStore {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        init_schema(&*repo.get_conn()?)?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn get_item(&self, item_id: i64) -> RepositoryResult<Option<FeedbackItem>> {
        let conn = self.get_conn()?;
        load_item(&conn, item_id)
    }

    /// 全部条目（按时间倒序）
    pub fn list_items(&self) -> RepositoryResult<Vec<FeedbackItem>> {
        let conn = self.get_conn()?;
        let ids = {
            let mut stmt =
                conn.prepare("SELECT id FROM feedback_item ORDER BY timestamp DESC, id")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = load_item(&conn, id)? {
                items.push(item);
            }
        }
        Ok(items)
    }

    pub fn count_items(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM feedback_item", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// 分类下每个词条挂接的条目数（按词条名称排序,含 0）
    pub fn term_item_counts(&self, taxonomy_slug: &str) -> RepositoryResult<Vec<TermCount>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.name, COUNT(it.item_id)
            FROM term t
            JOIN taxonomy x ON x.id = t.taxonomy_id
            LEFT JOIN item_term it ON it.term_id = t.id
            WHERE x.slug = ?1
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )?;
        let counts = stmt
            .query_map(params![taxonomy_slug], |row| {
                Ok(TermCount {
                    name: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}

impl ItemStore for SqliteItemStore {
    fn create_item(&self, fields: &BTreeMap<String, FieldValue>) -> RepositoryResult<FeedbackItem> {
        let item = validate(fields)?;
        let now = Utc::now();
        let timestamp = item.timestamp.unwrap_or(Some(now));

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO feedback_item (
                body, translation, timestamp, network_provider, location,
                sub_location, language, risk, gender, age, contributor,
                collection_type, external_id, created, last_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                item.text("body"),
                item.text("translation"),
                timestamp,
                item.text("network_provider"),
                item.text("location"),
                item.text("sub_location"),
                item.text("language"),
                item.text("risk"),
                item.text("gender"),
                item.text("age"),
                item.text("contributor"),
                item.text("collection_type"),
                item.text("external_id"),
                now,
                now,
            ],
        )
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::UniqueConstraintViolation(_) => {
                RepositoryError::UniqueConstraintViolation(t("store.not_unique"))
            }
            other => other,
        })?;

        let item_id = conn.last_insert_rowid();
        tracing::debug!(item_id = item_id, "条目已创建");

        load_item(&conn, item_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "feedback_item".to_string(),
            id: item_id.to_string(),
        })
    }

    fn add_terms(&self, item_id: i64, taxonomy: &str, names: &[String]) -> RepositoryResult<FeedbackItem> {
        let rejected = |detail: String| RepositoryError::TermRejected {
            detail,
            taxonomy: taxonomy.to_string(),
            name: names.join(", "),
        };

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM feedback_item WHERE id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound {
                entity: "feedback_item".to_string(),
                id: item_id.to_string(),
            });
        }

        let found = query_taxonomy(&tx, taxonomy)?
            .ok_or_else(|| rejected(t("store.taxonomy_not_found")))?;

        if found.multiplicity == Multiplicity::Optional && names.len() > 1 {
            return Err(rejected(t_with_args(
                "store.multiple_terms",
                &[("taxonomy", &found.name)],
            )));
        }

        let mut term_ids = Vec::with_capacity(names.len());
        for name in names {
            let term_id = match query_term_id(&tx, found.id, name)? {
                Some(id) => id,
                None if found.vocabulary.is_open() && !name.is_empty() => {
                    tracing::debug!(taxonomy = %taxonomy, name = %name, "开放词表,自动创建词条");
                    insert_term(&tx, found.id, name)?
                }
                None => {
                    return Err(RepositoryError::TermRejected {
                        detail: t("store.term_not_found"),
                        taxonomy: taxonomy.to_string(),
                        name: name.clone(),
                    })
                }
            };
            term_ids.push(term_id);
        }

        if found.multiplicity == Multiplicity::Optional && !term_ids.is_empty() {
            tx.execute(
                r#"
                DELETE FROM item_term
                WHERE item_id = ?1
                  AND term_id IN (SELECT id FROM term WHERE taxonomy_id = ?2)
                "#,
                params![item_id, found.id],
            )?;
        }

        for term_id in term_ids {
            tx.execute(
                "INSERT OR IGNORE INTO item_term (item_id, term_id) VALUES (?1, ?2)",
                params![item_id, term_id],
            )?;
        }

        tx.execute(
            "UPDATE feedback_item SET last_modified = ?1 WHERE id = ?2",
            params![Utc::now(), item_id],
        )?;
        tx.commit()?;

        load_item(&conn, item_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "feedback_item".to_string(),
            id: item_id.to_string(),
        })
    }
}

fn load_item(conn: &Connection, item_id: i64) -> RepositoryResult<Option<FeedbackItem>> {
    let item = conn
        .query_row(
            r#"
            SELECT id, body, translation, timestamp, network_provider, location,
                   sub_location, language, risk, gender, age, contributor,
                   collection_type, external_id, created, last_modified
            FROM feedback_item WHERE id = ?1
            "#,
            params![item_id],
            map_item_row,
        )
        .optional()?;

    let Some(mut item) = item else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        r#"
        SELECT x.slug, t.name
        FROM item_term it
        JOIN term t ON t.id = it.term_id
        JOIN taxonomy x ON x.id = t.taxonomy_id
        WHERE it.item_id = ?1
        ORDER BY x.slug, t.name
        "#,
    )?;
    item.terms = stmt
        .query_map(params![item_id], |row| Ok(TermRef::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(item))
}

fn map_item_row(row: &Row<'_>) -> rusqlite::Result<FeedbackItem> {
    Ok(FeedbackItem {
        id: row.get(0)?,
        body: row.get(1)?,
        translation: row.get(2)?,
        timestamp: row.get(3)?,
        network_provider: row.get(4)?,
        location: row.get(5)?,
        sub_location: row.get(6)?,
        language: row.get(7)?,
        risk: row.get(8)?,
        gender: row.get(9)?,
        age: row.get(10)?,
        contributor: row.get(11)?,
        collection_type: row.get(12)?,
        external_id: row.get(13)?,
        terms: Vec::new(),
        created: row.get(14)?,
        last_modified: row.get(15)?,
    })
}
