//! 测试支持 crate
//!
//! 提供 Mock 实现和测试工具：
//!
//! - [`mock::vfs`] - 宿主运行时操作（时间、凭据）
//! - [`mock::uaccess`] - 会失败的用户缓冲区
//! - [`mock::dir`] - 记录位置、可在指定位置拒绝的目录遍历接收方
//! - [`logger`] - 捕获日志记录

#![no_std]

extern crate alloc;

pub mod logger;
pub mod mock;
