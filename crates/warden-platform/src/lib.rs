pub mod crash_report;
pub mod paths;
pub mod storage;

pub use paths::{config_dir, crash_report_dir, data_dir, log_dir, StoragePaths};
pub use storage::{
    CookieStore, CustomBlockStore, FileBlockCache, FileCookieStore, FileCustomBlockStore,
    FileKickLogStore, KickLogStore, RemoteBlockCache,
};
