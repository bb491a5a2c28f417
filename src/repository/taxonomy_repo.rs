// ==========================================
// 人道反馈看板 - 分类体系仓储
// ==========================================
// 职责: 管理 taxonomy / term 表
// 红线: Repository 不含业务规则（开放/封闭词表的判定在条目仓储打标时执行）
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::taxonomy::{Multiplicity, Taxonomy, Term, Vocabulary};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct SqliteTaxonomyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaxonomyRepository {
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

    /// 创建分类（slug 已存在时更新名称、基数与词表开放度）
    pub fn create_taxonomy(
        &self,
        name: &str,
        slug: &str,
        multiplicity: Multiplicity,
        vocabulary: Vocabulary,
    ) -> RepositoryResult<Taxonomy> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO taxonomy (name, slug, multiplicity, vocabulary)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(slug) DO UPDATE SET
                name = excluded.name,
                multiplicity = excluded.multiplicity,
                vocabulary = excluded.vocabulary
            "#,
            params![name, slug, multiplicity.as_str(), vocabulary.as_str()],
        )?;

        query_taxonomy(&conn, slug)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "taxonomy".to_string(),
            id: slug.to_string(),
        })
    }

    /// 在指定分类下创建词条（已存在则原样返回）
    pub fn create_term(&self, taxonomy_slug: &str, name: &str, long_name: &str) -> RepositoryResult<Term> {
        let conn = self.get_conn()?;
        let taxonomy = query_taxonomy(&conn, taxonomy_slug)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "taxonomy".to_string(),
            id: taxonomy_slug.to_string(),
        })?;

        conn.execute(
            "INSERT OR IGNORE INTO term (taxonomy_id, name, long_name) VALUES (?1, ?2, ?3)",
            params![taxonomy.id, name, long_name],
        )?;

        conn.query_row(
            r#"
            SELECT t.id, x.slug, t.name, t.long_name
            FROM term t JOIN taxonomy x ON x.id = t.taxonomy_id
            WHERE t.taxonomy_id = ?1 AND t.name = ?2
            "#,
            params![taxonomy.id, name],
            map_term_row,
        )
        .map_err(RepositoryError::from)
    }

    pub fn find_taxonomy(&self, slug: &str) -> RepositoryResult<Option<Taxonomy>> {
        let conn = self.get_conn()?;
        query_taxonomy(&conn, slug)
    }

    pub fn list_taxonomies(&self) -> RepositoryResult<Vec<Taxonomy>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, slug, multiplicity, vocabulary FROM taxonomy ORDER BY slug",
        )?;
        let taxonomies = stmt
            .query_map([], map_taxonomy_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(taxonomies)
    }

    /// 分类下的全部词条（按名称排序）
    pub fn list_terms(&self, taxonomy_slug: &str) -> RepositoryResult<Vec<Term>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, x.slug, t.name, t.long_name
            FROM term t JOIN taxonomy x ON x.id = t.taxonomy_id
            WHERE x.slug = ?1
            ORDER BY t.name
            "#,
        )?;
        let terms = stmt
            .query_map(params![taxonomy_slug], map_term_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(terms)
    }
}

// ==========================================
// 连接级查询（供条目仓储在事务内复用）
// ==========================================

pub(crate) fn query_taxonomy(conn: &Connection, slug: &str) -> RepositoryResult<Option<Taxonomy>> {
    let taxonomy = conn
        .query_row(
            "SELECT id, name, slug, multiplicity, vocabulary FROM taxonomy WHERE slug = ?1",
            params![slug],
            map_taxonomy_row,
        )
        .optional()?;
    Ok(taxonomy)
}

pub(crate) fn query_term_id(conn: &Connection, taxonomy_id: i64, name: &str) -> RepositoryResult<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM term WHERE taxonomy_id = ?1 AND name = ?2",
            params![taxonomy_id, name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub(crate) fn insert_term(conn: &Connection, taxonomy_id: i64, name: &str) -> RepositoryResult<i64> {
    conn.execute(
        "INSERT INTO term (taxonomy_id, name, long_name) VALUES (?1, ?2, '')",
        params![taxonomy_id, name],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_taxonomy_row(row: &Row<'_>) -> rusqlite::Result<Taxonomy> {
    let multiplicity: String = row.get(3)?;
    let vocabulary: String = row.get(4)?;
    Ok(Taxonomy {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        multiplicity: Multiplicity::parse(&multiplicity).unwrap_or(Multiplicity::Multiple),
        vocabulary: Vocabulary::parse(&vocabulary).unwrap_or(Vocabulary::Closed),
    })
}

fn map_term_row(row: &Row<'_>) -> rusqlite::Result<Term> {
    Ok(Term {
        id: row.get(0)?,
        taxonomy: row.get(1)?,
        name: row.get(2)?,
        long_name: row.get(3)?,
    })
}
