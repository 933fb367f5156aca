/// Composition layer between HTTP handlers and the data/queue plumbing
///
/// Handlers talk to [`Services`] only. The category and service wrappers
/// delegate to the repositories; [`AuthService`] is the one place the API
/// produces background work.

use fixr_shared::error::RepositoryResult;
use fixr_shared::jobs::{JobClient, Lane, QueueError, WelcomeEmailPayload};
use fixr_shared::models::category::{Category, CreateCategory, ListCategoriesQuery, UpdateCategory};
use fixr_shared::models::pagination::Paginated;
use fixr_shared::models::service::{
    CreateService, ListServicesQuery, PopulatedService, Service, UpdateService,
};
use fixr_shared::repository::{CategoryRepository, Repositories, ServiceRepository};
use uuid::Uuid;

/// Everything a request handler can reach
#[derive(Clone)]
pub struct Services {
    pub category: CategoryService,
    pub service: CatalogService,
    pub auth: AuthService,
    pub job: JobClient,
}

impl Services {
    pub fn new(repos: Repositories, job: JobClient) -> Self {
        Self {
            category: CategoryService::new(repos.category),
            service: CatalogService::new(repos.service),
            auth: AuthService::new(job.clone()),
            job,
        }
    }
}

/// Category operations for the acting owner
#[derive(Clone)]
pub struct CategoryService {
    repo: CategoryRepository,
}

impl CategoryService {
    pub fn new(repo: CategoryRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, user_id: &str, data: CreateCategory) -> RepositoryResult<Category> {
        self.repo.create(user_id, data).await
    }

    pub async fn get(&self, user_id: &str, id: Uuid) -> RepositoryResult<Category> {
        self.repo.get_by_id(user_id, id).await
    }

    pub async fn list(
        &self,
        user_id: &str,
        query: &ListCategoriesQuery,
    ) -> RepositoryResult<Paginated<Category>> {
        self.repo.list(user_id, query).await
    }

    pub async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        data: UpdateCategory,
    ) -> RepositoryResult<Category> {
        self.repo.update(user_id, id, data).await
    }

    pub async fn delete(&self, user_id: &str, id: Uuid) -> RepositoryResult<()> {
        self.repo.delete(user_id, id).await
    }
}

/// Service-tree operations for the acting owner
#[derive(Clone)]
pub struct CatalogService {
    repo: ServiceRepository,
}

impl CatalogService {
    pub fn new(repo: ServiceRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, user_id: &str, data: CreateService) -> RepositoryResult<Service> {
        self.repo.create(user_id, data).await
    }

    pub async fn get(&self, user_id: &str, id: Uuid) -> RepositoryResult<PopulatedService> {
        self.repo.get_by_id(user_id, id).await
    }

    pub async fn list(
        &self,
        user_id: &str,
        query: &ListServicesQuery,
    ) -> RepositoryResult<Paginated<PopulatedService>> {
        self.repo.list(user_id, query).await
    }

    pub async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        data: UpdateService,
    ) -> RepositoryResult<Service> {
        self.repo.update(user_id, id, data).await
    }

    pub async fn delete(&self, user_id: &str, id: Uuid) -> RepositoryResult<()> {
        self.repo.delete(user_id, id).await
    }
}

/// Account lifecycle side effects
#[derive(Clone)]
pub struct AuthService {
    jobs: JobClient,
}

impl AuthService {
    pub fn new(jobs: JobClient) -> Self {
        Self { jobs }
    }

    /// Queues the welcome email on the `default` lane
    ///
    /// Returns once Redis has accepted the task; delivery happens in the
    /// worker.
    pub async fn send_welcome_email(&self, to: &str, first_name: &str) -> Result<Uuid, QueueError> {
        let task = WelcomeEmailPayload {
            to: to.to_string(),
            first_name: first_name.to_string(),
        }
        .into_task()?;

        let task_id = self.jobs.enqueue(task, Lane::Default).await?;
        tracing::info!(task_id = %task_id, to = %to, "Welcome email queued");
        Ok(task_id)
    }
}
