pub mod codec;
pub mod db;
pub mod raw_storage;
