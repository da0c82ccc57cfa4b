pub mod catalog;
pub mod init;
pub mod lifecycle;
pub mod logs;
pub mod project_root;
pub mod projects;
pub mod status;
