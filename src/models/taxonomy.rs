// src/models/taxonomy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'sectors' table: top level of the career taxonomy.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Sector {
    pub id: i64,

    /// Unique across all sectors, active or not.
    pub name: String,

    pub description: Option<String>,

    /// Soft-delete flag. Inactive sectors are hidden from public listings.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// Represents the 'branches' table. Each branch belongs to one sector.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sector_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Represents the 'specializations' table. Each specialization belongs to one branch
/// and owns the quizzes users take.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Specialization {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub branch_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A sector with its active branches and their active specializations.
#[derive(Debug, Serialize)]
pub struct SectorHierarchy {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub branches: Vec<BranchNode>,
}

#[derive(Debug, Serialize)]
pub struct BranchNode {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub specializations: Vec<SpecializationNode>,
}

#[derive(Debug, Serialize)]
pub struct SpecializationNode {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<Specialization> for SpecializationNode {
    fn from(spec: Specialization) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            description: spec.description,
        }
    }
}

/// Assembles the nested tree from flat rows.
///
/// Rows are expected to be active already; order of the input is preserved
/// at every level.
pub fn build_hierarchy(
    sectors: Vec<Sector>,
    branches: Vec<Branch>,
    specializations: Vec<Specialization>,
) -> Vec<SectorHierarchy> {
    let mut branch_nodes: Vec<(i64, BranchNode)> = branches
        .into_iter()
        .map(|b| {
            (
                b.sector_id,
                BranchNode {
                    id: b.id,
                    name: b.name,
                    description: b.description,
                    specializations: Vec::new(),
                },
            )
        })
        .collect();

    for spec in specializations {
        if let Some((_, node)) = branch_nodes.iter_mut().find(|(_, n)| n.id == spec.branch_id) {
            node.specializations.push(spec.into());
        }
    }

    sectors
        .into_iter()
        .map(|sector| {
            let (mine, rest): (Vec<_>, Vec<_>) = branch_nodes
                .drain(..)
                .partition(|(sector_id, _)| *sector_id == sector.id);
            branch_nodes = rest;

            SectorHierarchy {
                id: sector.id,
                name: sector.name,
                description: sector.description,
                branches: mine.into_iter().map(|(_, node)| node).collect(),
            }
        })
        .collect()
}

/// Admin view of a sector, including inactive rows.
#[derive(Debug, Serialize, FromRow)]
pub struct SectorAdminRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub branch_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Admin view of a branch with its parent name and child count.
#[derive(Debug, Serialize, FromRow)]
pub struct BranchAdminRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sector_id: i64,
    pub sector_name: Option<String>,
    pub is_active: bool,
    pub specialization_count: i64,
}

/// Admin view of a specialization with its ancestry and quiz count.
#[derive(Debug, Serialize, FromRow)]
pub struct SpecializationAdminRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub branch_id: i64,
    pub branch_name: Option<String>,
    pub sector_name: Option<String>,
    pub is_active: bool,
    pub quiz_count: i64,
}

/// DTO for creating a sector.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSectorRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

/// DTO for updating a sector. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSectorRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be between 1 and 150 characters."))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub sector_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBranchRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub sector_id: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSpecializationRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be between 1 and 150 characters."))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub branch_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSpecializationRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub branch_id: Option<i64>,
    pub is_active: Option<bool>,
}

/// Query parameters for the admin branch listing.
#[derive(Debug, Deserialize)]
pub struct BranchListParams {
    pub sector_id: Option<i64>,
}

/// Query parameters for the admin specialization listing.
#[derive(Debug, Deserialize)]
pub struct SpecializationListParams {
    pub branch_id: Option<i64>,
}
