// 存储模块 - 记录集合与持久化后端

// 子模块
pub mod collection;
pub mod config;
pub mod models;
pub mod repository;

// 重新导出主要类型
pub use collection::{Collection, Record};
pub use config::StorageConfig;
pub use models::*;
pub use repository::{open_backend, StorageBackend};

// 重新导出具体实现（可选，用于高级用法）
pub use repository::json_file::JsonFileBackend;
pub use repository::memory::MemoryBackend;
pub use repository::sqlite::SqliteBackend;
