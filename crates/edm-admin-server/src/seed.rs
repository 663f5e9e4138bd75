//! Startup data for the in-memory stores

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use edm_admin::models::{
    normalize_email, DirectoryUser, Document, NewArea, NewCompany, Role, UserAssignment, UserInput,
};
use edm_admin::services::AdminContext;
use edm_admin::store::{AreaStore, CompanyStore, MemoryBackend, UserStore};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub companies: Vec<SeedCompany>,
    #[serde(default)]
    pub areas: Vec<SeedArea>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub directory: Vec<DirectoryUser>,
    #[serde(default)]
    pub documents: Vec<SeedDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCompany {
    pub name: String,
    pub admin_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedArea {
    pub company_name: String,
    pub name: String,
    #[serde(default)]
    pub responsible_email: Option<String>,
    pub admin_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    pub company_name: String,
    pub area_name: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Counts of what was loaded
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub companies: usize,
    pub areas: usize,
    pub users: usize,
    pub directory: usize,
    pub documents: usize,
}

impl SeedData {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse seed file: {}", path.display()))
    }

    /// Write the records straight into the stores and provision their
    /// folders. Role rules are not applied; the seed is trusted.
    pub async fn apply(self, backend: &MemoryBackend, ctx: &AdminContext) -> Result<SeedSummary> {
        let drive_id = ctx.library.drive_id().await?;
        let mut summary = SeedSummary::default();

        for company in self.companies {
            backend
                .companies
                .create(NewCompany {
                    name: company.name.clone(),
                    admin_email: normalize_email(&company.admin_email),
                })
                .await?;
            ctx.folders.ensure_company(&drive_id, &company.name).await?;
            summary.companies += 1;
        }

        for area in self.areas {
            backend
                .areas
                .create(NewArea {
                    name: area.name.clone(),
                    company_name: area.company_name.clone(),
                    responsible_email: area.responsible_email.as_deref().map(normalize_email),
                    admin_email: normalize_email(&area.admin_email),
                })
                .await?;
            ctx.folders
                .ensure_area(&drive_id, &area.company_name, &area.name)
                .await?;
            summary.areas += 1;
        }

        for user in self.users {
            let record = UserAssignment {
                id: String::new(),
                name: user.name,
                email: normalize_email(&user.email),
                role: user.role,
                company_name: user.company_name,
                area_name: user.area_name,
            };
            let input = UserInput::from_existing(&record);
            if input.role() != record.role {
                warn!(email = %record.email, role = %record.role.as_str(), "Seed user lacks the scope its role needs; stored as NoAccess");
            }
            backend.users.upsert_by_email(input).await?;
            summary.users += 1;
        }

        for person in self.directory {
            backend
                .directory
                .add(DirectoryUser::new(person.name, &person.email))
                .await;
            summary.directory += 1;
        }

        for doc in self.documents {
            let (folder, _) = ctx
                .folders
                .ensure_area(&drive_id, &doc.company_name, &doc.area_name)
                .await?;
            backend
                .folders
                .add_document(
                    &folder.id,
                    Document {
                        id: uuid::Uuid::new_v4().to_string(),
                        drive_id: drive_id.clone(),
                        name: doc.name,
                        size: doc.size,
                        mime_type: doc.mime_type,
                        last_modified: doc.last_modified.unwrap_or_else(Utc::now),
                        thumbnail_url: None,
                        download_url: None,
                    },
                )
                .await?;
            summary.documents += 1;
        }

        info!(
            companies = summary.companies,
            areas = summary.areas,
            users = summary.users,
            directory = summary.directory,
            documents = summary.documents,
            "Seed data loaded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edm_admin::services::{AreaRef, DocumentService};
    use edm_admin::store::MEMORY_DRIVE_ID;
    use edm_admin::AdminConfig;
    use std::io::Write;

    const SEED: &str = r#"{
        "companies": [{"name": "Acme", "adminEmail": "Boss@Acme.com"}],
        "areas": [{"companyName": "Acme", "name": "Ventas", "responsibleEmail": "rosa@acme.com", "adminEmail": "boss@acme.com"}],
        "users": [
            {"name": "Root", "email": "root@edm.com", "role": "GeneralAdmin"},
            {"name": "Boss", "email": "boss@acme.com", "role": "company admin", "companyName": "Acme"},
            {"name": "Rosa", "email": "rosa@acme.com", "role": "AreaResponsible", "companyName": "Acme", "areaName": "Ventas"},
            {"name": "Lost", "email": "lost@acme.com", "role": "AreaMember", "companyName": "Acme"}
        ],
        "directory": [{"name": "Ana", "email": "ANA@acme.com"}],
        "documents": [{"companyName": "Acme", "areaName": "Ventas", "name": "plan.pdf", "size": 2048, "mimeType": "application/pdf"}]
    }"#;

    #[tokio::test]
    async fn test_seed_file_populates_stores_and_folders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let config = AdminConfig::default();
        let backend = MemoryBackend::new(&config);
        let ctx = backend.context(config);
        let summary = SeedData::from_file(file.path())
            .unwrap()
            .apply(&backend, &ctx)
            .await
            .unwrap();

        assert_eq!(
            summary,
            SeedSummary {
                companies: 1,
                areas: 1,
                users: 4,
                directory: 1,
                documents: 1,
            }
        );
        let boss = backend.users.get_by_email("boss@acme.com").await.unwrap().unwrap();
        assert_eq!(boss.role, Role::CompanyAdmin);
        let lost = backend.users.get_by_email("lost@acme.com").await.unwrap().unwrap();
        assert_eq!(lost.role, Role::NoAccess);
        assert!(backend
            .folders
            .folder_at(MEMORY_DRIVE_ID, &["Acme", "Ventas"])
            .await
            .is_some());

        let documents = DocumentService::new(ctx.clone())
            .list(&AreaRef::with_names("unknown", "Acme", "Ventas"))
            .await
            .unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].document.name, "plan.pdf");
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed: SeedData = serde_json::from_str(r#"{"companies": []}"#).unwrap();
        assert!(seed.users.is_empty());
        assert!(seed.documents.is_empty());
    }

    #[test]
    fn test_unreadable_seed_file_names_the_path() {
        let err = SeedData::from_file(Path::new("/nonexistent/seed.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/seed.json"));
    }
}
