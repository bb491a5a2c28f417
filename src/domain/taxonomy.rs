// ==========================================
// 人道反馈看板 - 分类体系领域模型
// ==========================================
// 用途: 条目打标（item-types / tags / data-origins ...）
// 红线: 封闭词表不自动创建词条
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 基数 (Multiplicity)
// ==========================================
// optional: 每个条目至多一个词条（再次打标即替换）
// multiple: 每个条目可挂多个词条
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    Optional,
    Multiple,
}

impl Multiplicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Multiplicity::Optional => "optional",
            Multiplicity::Multiple => "multiple",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "optional" => Some(Multiplicity::Optional),
            "multiple" => Some(Multiplicity::Multiple),
            _ => None,
        }
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 词表开放度 (Vocabulary)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vocabulary {
    Fixed,  // 仅系统可修改
    Closed, // 仅管理员可维护
    Open,   // 引用时自动创建
}

impl Vocabulary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vocabulary::Fixed => "fixed",
            Vocabulary::Closed => "closed",
            Vocabulary::Open => "open",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "fixed" => Some(Vocabulary::Fixed),
            "closed" => Some(Vocabulary::Closed),
            "open" => Some(Vocabulary::Open),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Vocabulary::Open)
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub multiplicity: Multiplicity,
    pub vocabulary: Vocabulary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: i64,
    pub taxonomy: String, // taxonomy slug
    pub name: String,
    pub long_name: String,
}

/// 词条及其关联条目数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub name: String,
    pub count: usize,
}
