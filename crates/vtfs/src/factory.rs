//! 节点工厂
//!
//! 分配节点编号，并请求宿主生成绑定了 VTFS 操作表的 [`Inode`] 对象。

use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use log::error;
use vfs::{FileMode, FsError, Inode, SuperBlock};

use crate::node::NodeDescriptor;
use crate::ops::{VTFS_FILE_OPS, VTFS_INODE_OPS};

/// 每次挂载独立的节点编号分配器
///
/// 编号单调递增，挂载期间不会复用；计数器无法再前进时分配失败，
/// 不会回绕。
#[derive(Debug)]
pub struct InoAllocator {
    next: AtomicUsize,
}

impl InoAllocator {
    /// 从 `first` 开始分配
    pub const fn new(first: usize) -> Self {
        Self {
            next: AtomicUsize::new(first),
        }
    }

    /// 分配一个新编号；编号耗尽时返回 [`FsError::OutOfMemory`]
    pub fn alloc(&self) -> Result<usize, FsError> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |ino| ino.checked_add(1))
            .map_err(|_| FsError::OutOfMemory)
    }

    /// 下一个将要分配的编号
    pub fn peek(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }
}

fn mint(sb: &Arc<SuperBlock>, ino: usize) -> Result<Inode, FsError> {
    sb.new_inode().ok_or_else(|| {
        error!("vtfs: failed to allocate inode {}", ino);
        FsError::OutOfMemory
    })
}

fn finish(mut inode: Inode, ino: usize) -> Arc<Inode> {
    inode.set_ino(ino);
    inode.set_ops(&VTFS_INODE_OPS, &VTFS_FILE_OPS);
    let inode = Arc::new(inode);
    inode.inc_nlink();
    if inode.is_dir() {
        inode.inc_nlink();
    }
    inode
}

/// 为新节点生成宿主 inode
///
/// 所有者按当前任务凭据与父目录 `dir` 初始化。
/// 目录的链接数为 2，普通文件为 1。宿主无法再分配 inode 对象时返回
/// [`FsError::OutOfMemory`]。
pub fn vtfs_get_inode(
    sb: &Arc<SuperBlock>,
    dir: Option<&Inode>,
    mode: FileMode,
    ino: usize,
) -> Result<Arc<Inode>, FsError> {
    let mut inode = mint(sb, ino)?;
    inode.init_owner(dir, mode);
    Ok(finish(inode, ino))
}

/// 为已存在的节点重建宿主 inode，恢复其所有者、模式和大小
///
/// 每次调用都生成一个新的 inode 对象，同一节点的多个对象之间不共享状态。
/// 目录的链接数按存储中的子目录数重新计算（2 + 子目录数）。
pub fn vtfs_iget(sb: &Arc<SuperBlock>, node: &NodeDescriptor) -> Result<Arc<Inode>, FsError> {
    let mut inode = mint(sb, node.ino)?;
    inode.set_owner(node.owner.uid, node.owner.gid, node.mode);
    let inode = finish(inode, node.ino);
    for _ in 0..node.subdirs {
        inode.inc_nlink();
    }
    inode.set_size(node.size);
    Ok(inode)
}
