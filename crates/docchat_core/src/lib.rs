pub mod db;
pub mod documents;
pub mod error;
pub mod storage;
