//! VFS 运行时操作 trait 定义和注册
//!
//! 此模块定义了 VFS 层需要的外部依赖接口（时间、当前进程凭据），
//! 通过 trait 抽象实现与宿主环境的解耦。

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::TimeSpec;

/// VFS 运行时操作
///
/// 宿主需要实现此 trait 并在挂载任何文件系统前注册。
pub trait VfsOps: Send + Sync {
    // ========== 时间 ==========

    /// 获取当前时间
    fn timespec_now(&self) -> TimeSpec;

    // ========== 凭据 ==========

    /// 当前任务的文件系统用户 ID
    fn current_fsuid(&self) -> u32;

    /// 当前任务的文件系统组 ID
    fn current_fsgid(&self) -> u32;
}

// ========== VfsOps 注册 ==========

static VFS_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static VFS_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册 VFS 操作实现
///
/// # Safety
/// 首次注册必须在单线程环境下完成；之后只允许以同一个实例重复注册。
pub unsafe fn register_vfs_ops(ops: &'static dyn VfsOps) {
    let ptr = ops as *const dyn VfsOps;
    // SAFETY: 将 fat pointer 拆分为 data 和 vtable 两部分存储
    let (data, vtable) =
        unsafe { core::mem::transmute::<*const dyn VfsOps, (usize, usize)>(ptr) };
    VFS_OPS_VTABLE.store(vtable, Ordering::Release);
    VFS_OPS_DATA.store(data, Ordering::Release);
}

/// 获取已注册的 VFS 操作实现
///
/// # Panics
/// 如果尚未调用 [`register_vfs_ops`] 注册实现，则 panic
#[inline]
pub fn vfs_ops() -> &'static dyn VfsOps {
    let data = VFS_OPS_DATA.load(Ordering::Acquire);
    let vtable = VFS_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        panic!("vfs: VfsOps not registered");
    }
    // SAFETY: 重组 fat pointer
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn VfsOps>((data, vtable)) }
}
