// 服务层

pub mod executor;
pub mod files;
pub mod fs;
pub mod sftp;
pub mod storage;
pub mod sync;
