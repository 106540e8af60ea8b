//! Mock 实现模块
//!
//! 提供宿主侧各接口的 Mock 实现，用于测试

pub mod dir;
pub mod uaccess;
pub mod vfs;
