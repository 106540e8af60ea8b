//! 超级块
//!
//! 每次挂载对应一个 [`SuperBlock`]。它负责分配宿主侧的 [`Inode`] 对象、
//! 持有根目录项，并保存文件系统私有数据（`s_fs_info`）。

use alloc::sync::Arc;
use core::any::Any;
use core::sync::atomic::{AtomicUsize, Ordering};

use sync::SpinLock;

use crate::{Dentry, Inode};

/// 超级块
pub struct SuperBlock {
    /// 文件系统类型名称
    fs_type: &'static str,
    /// 允许同时存在的 inode 对象上限（0 表示无限制）
    max_inodes: usize,
    /// 当前存活的 inode 对象数
    nr_inodes: AtomicUsize,
    /// 根目录项
    root: SpinLock<Option<Arc<Dentry>>>,
    /// 文件系统私有数据
    fs_info: SpinLock<Option<Arc<dyn Any + Send + Sync>>>,
}

impl SuperBlock {
    /// 创建超级块
    ///
    /// # 参数
    ///
    /// - `fs_type`: 文件系统类型名称
    /// - `max_inodes`: inode 对象上限，0 表示无限制
    pub fn new(fs_type: &'static str, max_inodes: usize) -> Arc<Self> {
        Arc::new(Self {
            fs_type,
            max_inodes,
            nr_inodes: AtomicUsize::new(0),
            root: SpinLock::new(None),
            fs_info: SpinLock::new(None),
        })
    }

    /// 文件系统类型名称
    pub fn fs_type(&self) -> &'static str {
        self.fs_type
    }

    /// 分配一个新的 inode 对象
    ///
    /// 返回的 inode 尚未共享，调用者填写编号、模式和操作表后再放入 `Arc`。
    /// 达到上限时返回 `None`。
    pub fn new_inode(self: &Arc<Self>) -> Option<Inode> {
        let reserved = self
            .nr_inodes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if self.max_inodes != 0 && n >= self.max_inodes {
                    None
                } else {
                    Some(n + 1)
                }
            });
        reserved.ok()?;
        Some(Inode::new(Arc::downgrade(self)))
    }

    /// 当前存活的 inode 对象数
    pub fn nr_inodes(&self) -> usize {
        self.nr_inodes.load(Ordering::Acquire)
    }

    pub(crate) fn release_inode(&self) {
        self.nr_inodes.fetch_sub(1, Ordering::AcqRel);
    }

    /// 设置根目录项
    pub fn set_root(&self, root: Arc<Dentry>) {
        *self.root.lock() = Some(root);
    }

    /// 根目录项
    pub fn root(&self) -> Option<Arc<Dentry>> {
        self.root.lock().clone()
    }

    /// 取走根目录项（卸载时使用）
    pub fn take_root(&self) -> Option<Arc<Dentry>> {
        self.root.lock().take()
    }

    /// 设置文件系统私有数据
    pub fn set_fs_info<T: Any + Send + Sync>(&self, info: Arc<T>) {
        *self.fs_info.lock() = Some(info as Arc<dyn Any + Send + Sync>);
    }

    /// 以具体类型取出文件系统私有数据
    pub fn fs_info<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let info = self.fs_info.lock().clone()?;
        info.downcast::<T>().ok()
    }

    /// 清除文件系统私有数据
    pub fn clear_fs_info(&self) {
        self.fs_info.lock().take();
    }
}

impl core::fmt::Debug for SuperBlock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SuperBlock")
            .field("fs_type", &self.fs_type)
            .field("nr_inodes", &self.nr_inodes())
            .field("max_inodes", &self.max_inodes)
            .finish()
    }
}
