pub mod create;
pub mod edit;
pub mod init;
pub mod list;
pub mod show;
pub mod status;
