pub mod config;
pub mod data;
pub mod jd_cloud;
