//! Role-scoped navigation tree
//!
//! The tree is built from the full company and area lists, then cut down for
//! the caller by [`filter_tree`]. Both steps are pure; [`load_tree`] wires
//! them to the stores.

pub mod state;

pub use state::*;

use serde::Serialize;

use crate::error::AdminResult;
use crate::models::{Area, Company, Role, UserContext};
use crate::services::AdminContext;

pub const HOME_ID: &str = "home";
pub const COMPANIES_ID: &str = "companies";

/// What selecting a node opens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavTarget {
    Home,
    Companies,
    #[serde(rename_all = "camelCase")]
    Company { company_name: String },
    #[serde(rename_all = "camelCase")]
    Area {
        area_id: String,
        company_name: String,
        area_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavNode {
    pub id: String,
    pub label: String,
    /// Roles allowed to see the node; `None` means everyone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
    pub target: NavTarget,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl NavNode {
    fn leaf(id: impl Into<String>, label: impl Into<String>, target: NavTarget) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            roles: None,
            target,
            children: Vec::new(),
        }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.roles.as_ref().map_or(true, |roles| roles.contains(&role))
    }
}

pub fn company_node_id(company: &Company) -> String {
    format!("c-{}", company.id)
}

pub fn area_node_id(area: &Area) -> String {
    format!("a-{}", area.id)
}

/// Home plus an empty Companies root
pub fn base_tree() -> Vec<NavNode> {
    vec![
        NavNode {
            roles: Some(Role::ALL.to_vec()),
            ..NavNode::leaf(HOME_ID, "Home", NavTarget::Home)
        },
        NavNode {
            roles: Some(
                Role::ALL
                    .into_iter()
                    .filter(|r| *r != Role::NoAccess)
                    .collect(),
            ),
            ..NavNode::leaf(COMPANIES_ID, "Companies", NavTarget::Companies)
        },
    ]
}

/// Full Companies -> Areas tree, unfiltered
pub fn build_tree(companies: &[Company], areas: &[Area]) -> Vec<NavNode> {
    let company_nodes: Vec<NavNode> = companies
        .iter()
        .map(|company| {
            let children = areas
                .iter()
                .filter(|a| same_label(&a.company_name, &company.name))
                .map(|area| {
                    NavNode::leaf(
                        area_node_id(area),
                        area.name.clone(),
                        NavTarget::Area {
                            area_id: area.id.clone(),
                            company_name: company.name.clone(),
                            area_name: area.name.clone(),
                        },
                    )
                })
                .collect();
            NavNode {
                children,
                ..NavNode::leaf(
                    company_node_id(company),
                    company.name.clone(),
                    NavTarget::Company {
                        company_name: company.name.clone(),
                    },
                )
            }
        })
        .collect();

    base_tree()
        .into_iter()
        .map(|mut node| {
            if node.id == COMPANIES_ID {
                node.children = company_nodes.clone();
            }
            node
        })
        .collect()
}

/// Cut the tree down to what `role` may see.
///
/// Nodes whose allow-list excludes the role go first, children only after
/// their parent survived. Roles below GeneralAdmin keep only their own
/// company, area-scoped roles only their own area.
pub fn filter_tree(
    tree: &[NavNode],
    role: Role,
    scope_company: Option<&str>,
    scope_area: Option<&str>,
) -> Vec<NavNode> {
    tree.iter()
        .filter(|node| node.allows(role))
        .filter(|node| in_scope(node, role, scope_company, scope_area))
        .map(|node| NavNode {
            children: filter_tree(&node.children, role, scope_company, scope_area),
            ..node.clone()
        })
        .collect()
}

fn in_scope(node: &NavNode, role: Role, scope_company: Option<&str>, scope_area: Option<&str>) -> bool {
    match &node.target {
        NavTarget::Company { company_name } if role != Role::GeneralAdmin => {
            scope_company.is_some_and(|scope| same_label(company_name, scope))
        }
        NavTarget::Area { area_name, .. } if role.has_area() => {
            scope_area.is_some_and(|scope| same_label(area_name, scope))
        }
        _ => true,
    }
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Depth-first lookup
pub fn find_by_id<'a>(nodes: &'a [NavNode], id: &str) -> Option<&'a NavNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(hit) = find_by_id(&node.children, id) {
            return Some(hit);
        }
    }
    None
}

/// Every id in the tree
pub fn node_ids(nodes: &[NavNode]) -> Vec<String> {
    let mut ids = Vec::new();
    let mut stack: Vec<&NavNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        ids.push(node.id.clone());
        stack.extend(node.children.iter());
    }
    ids
}

/// Read both lists and return the caller's view of the tree
pub async fn load_tree(ctx: &AdminContext, user: &UserContext) -> AdminResult<Vec<NavNode>> {
    let companies = ctx.companies.list().await?;
    let areas = ctx.areas.list().await?;
    let tree = build_tree(&companies, &areas);
    let filtered = filter_tree(&tree, user.role, user.company(), user.area());
    tracing::debug!(
        email = %user.email,
        role = %user.role,
        nodes = node_ids(&filtered).len(),
        "Navigation tree built"
    );
    Ok(filtered)
}
