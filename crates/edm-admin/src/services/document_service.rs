//! Document listing for an area folder

use super::area_service::AreaRef;
use super::AdminContext;
use crate::error::AdminResult;
use crate::models::DocumentView;

pub struct DocumentService {
    ctx: AdminContext,
}

impl DocumentService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Files in the area's folder
    pub async fn list(&self, area: &AreaRef) -> AdminResult<Vec<DocumentView>> {
        let area = self.ctx.find_area(&area.id, area.fallback()).await?;
        self.list_for(&area.company_name, &area.name).await
    }

    /// Files in `company/area`. A missing folder lists as empty.
    pub async fn list_for(&self, company: &str, area: &str) -> AdminResult<Vec<DocumentView>> {
        let drive_id = self.ctx.library.drive_id().await?;
        let Some(folder) = self.ctx.folders.find_area(&drive_id, company, area).await? else {
            tracing::warn!(company = %company, area = %area, "Area folder not found");
            return Ok(Vec::new());
        };

        let documents = self
            .ctx
            .folders
            .store()
            .list_children(&drive_id, &folder.id)
            .await?;
        tracing::debug!(company = %company, area = %area, count = documents.len(), "Documents listed");
        Ok(documents.into_iter().map(DocumentView::from).collect())
    }
}
