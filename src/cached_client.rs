//! Caching wrapper over [`ApiClient`] for the slow-changing listings.
//!
//! Types, statuses, priorities, projects and users rarely change between
//! requests, so their pages are kept in a shared [`ResponseCache`]. Work
//! package listings are the volatile data the whole plugin exists to show
//! and always go to the backend, as do avatars.

use std::sync::Arc;

use crate::cache::{CachedPage, ResponseCache};
use crate::client::ApiClient;
use crate::error::Result;
use crate::responses::PaginatedResult;
use crate::types::{Priority, Project, Status, User, UserAvatar, WorkPackage, WorkPackageType};

pub struct CachedClient {
    client: ApiClient,
    client_id: String,
    cache: Arc<ResponseCache>,
}

impl CachedClient {
    /// Wraps a client. `client_id` scopes cache entries so connections
    /// sharing one cache never see each other's pages.
    pub fn new(client: ApiClient, client_id: impl Into<String>, cache: Arc<ResponseCache>) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            cache,
        }
    }

    pub fn server(&self) -> &str {
        self.client.server()
    }

    pub async fn work_packages(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
        sort_by: &str,
    ) -> Result<PaginatedResult<WorkPackage>> {
        self.client
            .work_packages(offset, page_size, filters, sort_by)
            .await
    }

    pub async fn project_work_packages(
        &self,
        project: &str,
        offset: usize,
        page_size: usize,
        filters: &str,
        sort_by: &str,
    ) -> Result<PaginatedResult<WorkPackage>> {
        self.client
            .project_work_packages(project, offset, page_size, filters, sort_by)
            .await
    }

    pub async fn users(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<User>> {
        let key = self.key("users", offset, page_size, filters);
        if let Some(CachedPage::Users(page)) = self.cache.get(&key) {
            return Ok(page);
        }
        let page = self.client.users(offset, page_size, filters).await?;
        self.cache.insert(key, CachedPage::Users(page.clone()));
        Ok(page)
    }

    pub async fn projects(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<Project>> {
        let key = self.key("projects", offset, page_size, filters);
        if let Some(CachedPage::Projects(page)) = self.cache.get(&key) {
            return Ok(page);
        }
        let page = self.client.projects(offset, page_size, filters).await?;
        self.cache.insert(key, CachedPage::Projects(page.clone()));
        Ok(page)
    }

    pub async fn types(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<WorkPackageType>> {
        let key = self.key("types", offset, page_size, filters);
        if let Some(CachedPage::Types(page)) = self.cache.get(&key) {
            return Ok(page);
        }
        let page = self.client.types(offset, page_size, filters).await?;
        self.cache.insert(key, CachedPage::Types(page.clone()));
        Ok(page)
    }

    pub async fn statuses(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<Status>> {
        let key = self.key("statuses", offset, page_size, filters);
        if let Some(CachedPage::Statuses(page)) = self.cache.get(&key) {
            return Ok(page);
        }
        let page = self.client.statuses(offset, page_size, filters).await?;
        self.cache.insert(key, CachedPage::Statuses(page.clone()));
        Ok(page)
    }

    pub async fn priorities(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<Priority>> {
        let key = self.key("priorities", offset, page_size, filters);
        if let Some(CachedPage::Priorities(page)) = self.cache.get(&key) {
            return Ok(page);
        }
        let page = self.client.priorities(offset, page_size, filters).await?;
        self.cache.insert(key, CachedPage::Priorities(page.clone()));
        Ok(page)
    }

    pub async fn user_avatar(&self, user_id: &str) -> Result<UserAvatar> {
        self.client.user_avatar(user_id).await
    }

    fn key(&self, kind: &str, offset: usize, page_size: usize, filters: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.client_id, kind, offset, page_size, filters
        )
    }
}
