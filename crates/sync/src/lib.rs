//! 同步原语
//!
//! 向文件系统各模块提供基本的锁原语：
//!
//! - [`SpinLock`] - 互斥自旋锁
//! - [`RwLock`] - 读写自旋锁（基于 `lock_api`）
//!
//! 所有锁均不可重入，且不会让出 CPU；持锁期间不应回调外部代码。

#![no_std]

mod raw_spin_lock;
mod rwlock;
mod spin_lock;

pub use raw_spin_lock::*;
pub use rwlock::*;
pub use spin_lock::*;
