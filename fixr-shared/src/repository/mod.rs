/// Postgres repositories
///
/// One repository per aggregate, each a cheap clone around the shared pool.
///
/// # Example
///
/// ```no_run
/// use fixr_shared::repository::Repositories;
/// use fixr_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_env()?).await?;
/// let repos = Repositories::new(pool);
///
/// let category = repos.category.get_by_id("user_1", uuid::Uuid::new_v4()).await;
/// assert!(category.is_err());
/// # Ok(())
/// # }
/// ```

pub mod category;
pub mod service;

use sqlx::PgPool;

pub use category::CategoryRepository;
pub use service::ServiceRepository;

/// All repositories over one pool
#[derive(Clone)]
pub struct Repositories {
    pub category: CategoryRepository,
    pub service: ServiceRepository,
}

impl Repositories {
    pub fn new(db: PgPool) -> Self {
        Self {
            category: CategoryRepository::new(db.clone()),
            service: ServiceRepository::new(db),
        }
    }
}
