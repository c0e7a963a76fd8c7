//! Общие части агрегатов: id, базовые поля, метаданные

pub mod aggregate_id;
pub mod base_aggregate;
pub mod entity_metadata;

// Re-exports
pub use aggregate_id::AggregateId;
pub use base_aggregate::BaseAggregate;
pub use entity_metadata::EntityMetadata;
