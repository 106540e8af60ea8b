//! VFS 运行时操作的 Mock 实现

use core::sync::atomic::{AtomicI64, Ordering};

use vfs::{TimeSpec, VfsOps, register_vfs_ops};

/// Mock 凭据使用的用户 ID
pub const MOCK_UID: u32 = 1000;
/// Mock 凭据使用的组 ID
pub const MOCK_GID: u32 = 1000;

/// Mock 的 VFS 操作
///
/// 时间每读取一次前进一秒，凭据固定为 [`MOCK_UID`] / [`MOCK_GID`]。
pub struct MockVfsOps {
    clock: AtomicI64,
}

impl MockVfsOps {
    /// 创建 Mock 实例
    pub const fn new() -> Self {
        Self {
            clock: AtomicI64::new(1),
        }
    }
}

impl Default for MockVfsOps {
    fn default() -> Self {
        Self::new()
    }
}

impl VfsOps for MockVfsOps {
    fn timespec_now(&self) -> TimeSpec {
        TimeSpec::new(self.clock.fetch_add(1, Ordering::Relaxed), 0)
    }

    fn current_fsuid(&self) -> u32 {
        MOCK_UID
    }

    fn current_fsgid(&self) -> u32 {
        MOCK_GID
    }
}

/// 全局 Mock 实例
pub static MOCK_VFS_OPS: MockVfsOps = MockVfsOps::new();

/// 注册全局 Mock 实例
///
/// 可以在每个测试开头重复调用。
pub fn init() {
    // SAFETY: 始终注册同一个 'static 实例
    unsafe { register_vfs_ops(&MOCK_VFS_OPS) };
}
