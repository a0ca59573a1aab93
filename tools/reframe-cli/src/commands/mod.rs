pub mod analyze;
pub mod export;
pub mod info;
pub mod init;
pub mod validate;
