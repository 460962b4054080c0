// 駆動される側アダプター（リポジトリ実装）

mod catalog_repository;
mod collection_repository;
mod inventory_repository;
mod order_repository;
mod review_repository;

pub use catalog_repository::MySqlCatalogRepository;
pub use collection_repository::MySqlCollectionRepository;
pub use inventory_repository::MySqlInventoryRepository;
pub use order_repository::MySqlOrderRepository;
pub use review_repository::MySqlReviewRepository;
