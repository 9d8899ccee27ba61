pub mod init;
pub mod seed;
pub mod smoke;
pub mod status;
