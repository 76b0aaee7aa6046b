pub mod filesystem;
pub mod logging;
pub mod storage;
