pub mod ingestion_service;
pub mod memory_store;
pub mod scheduler_service;
pub mod sources;
pub mod vacancy_service;
pub mod vacancy_store;
