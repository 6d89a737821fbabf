pub mod dialog;
pub mod display;
pub mod init;
pub mod message;
