// ==========================================
// 人道反馈看板 - 内置导入配置与默认分类
// ==========================================
// 职责: 安装 geopoll / rapidpro / kobo 配置与默认分类体系（幂等）
// 说明: 这是唯一写入 sheet_profile 的入口,导入器只读
// ==========================================

use crate::domain::profile::SheetProfile;
use crate::domain::taxonomy::{Multiplicity, Vocabulary};
use crate::repository::{
    RepositoryError, RepositoryResult, SqliteProfileStore, SqliteTaxonomyRepository,
};

const BUILTIN_PROFILE_SOURCES: &[&str] = &[
    include_str!("profiles/geopoll.json"),
    include_str!("profiles/rapidpro.json"),
    include_str!("profiles/kobo.json"),
];

/// 默认分类定义
struct TaxonomySeed {
    name: &'static str,
    slug: &'static str,
    multiplicity: Multiplicity,
    vocabulary: Vocabulary,
    terms: &'static [(&'static str, &'static str)], // (name, long_name)
}

const DEFAULT_TAXONOMIES: &[TaxonomySeed] = &[
    TaxonomySeed {
        name: "Item Types",
        slug: "item-types",
        multiplicity: Multiplicity::Optional,
        vocabulary: Vocabulary::Closed,
        terms: &[("question", "Question"), ("rumor", "Rumor")],
    },
    TaxonomySeed {
        name: "Tags",
        slug: "tags",
        multiplicity: Multiplicity::Multiple,
        vocabulary: Vocabulary::Open,
        terms: &[],
    },
    TaxonomySeed {
        name: "Data Origins",
        slug: "data-origins",
        multiplicity: Multiplicity::Optional,
        vocabulary: Vocabulary::Closed,
        terms: &[
            ("Geopoll Spreadsheet", "Geopoll Spreadsheet"),
            ("Rapidpro Spreadsheet", "Rapidpro Spreadsheet"),
            ("Form Entry", "Form Entry"),
        ],
    },
    TaxonomySeed {
        name: "Countries",
        slug: "countries",
        multiplicity: Multiplicity::Optional,
        vocabulary: Vocabulary::Closed,
        terms: &[("Liberia", "Liberia")],
    },
    TaxonomySeed {
        name: "Contexts",
        slug: "contexts",
        multiplicity: Multiplicity::Optional,
        vocabulary: Vocabulary::Closed,
        terms: &[("Ebola-Liberia", "Ebola-Liberia")],
    },
];

/// 解析内置配置
pub fn builtin_profiles() -> RepositoryResult<Vec<SheetProfile>> {
    BUILTIN_PROFILE_SOURCES
        .iter()
        .map(|source| serde_json::from_str::<SheetProfile>(source).map_err(RepositoryError::from))
        .collect()
}

/// 安装内置导入配置（已存在则覆盖）
///
/// # 返回
/// - 安装的配置数量
pub fn seed_builtin_profiles(store: &SqliteProfileStore) -> RepositoryResult<usize> {
    let profiles = builtin_profiles()?;
    for profile in &profiles {
        store.upsert_profile(profile)?;
        tracing::info!(label = %profile.label, columns = profile.columns.len(), "内置导入配置已安装");
    }
    Ok(profiles.len())
}

/// 安装默认分类体系与词条
pub fn seed_default_taxonomies(repo: &SqliteTaxonomyRepository) -> RepositoryResult<usize> {
    for seed in DEFAULT_TAXONOMIES {
        repo.create_taxonomy(seed.name, seed.slug, seed.multiplicity, seed.vocabulary)?;
        for (name, long_name) in seed.terms {
            repo.create_term(seed.slug, name, long_name)?;
        }
        tracing::debug!(slug = seed.slug, terms = seed.terms.len(), "默认分类已安装");
    }
    Ok(DEFAULT_TAXONOMIES.len())
}
