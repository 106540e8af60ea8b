//! 名字解析与名字空间操作的分派
//!
//! 宿主负责逐级路径解析，每一级只向文件系统发起一次
//! [`InodeOperations::lookup`](crate::InodeOperations::lookup)。
//! 创建与删除同样以“父目录 + 名字”的形式分派到文件系统。

use alloc::sync::Arc;

use log::debug;

use crate::{Dentry, FileMode, FsError, Inode, PathComponent, parse_path};

/// 取出目录项绑定的目录 inode
fn dir_inode(dir: &Arc<Dentry>) -> Result<Arc<Inode>, FsError> {
    let inode = dir.inode().ok_or(FsError::NotFound)?;
    if !inode.is_dir() {
        return Err(FsError::NotDirectory);
    }
    Ok(inode)
}

/// 在目录 `dir` 中解析单个名字
///
/// 返回的目录项可能是负目录项（名字不存在）。
/// `.` 返回 `dir` 本身，`..` 返回父目录项（根目录的父目录是自己）。
pub fn vfs_lookup_at(dir: &Arc<Dentry>, name: &str) -> Result<Arc<Dentry>, FsError> {
    let inode = dir_inode(dir)?;
    match name {
        "." => return Ok(dir.clone()),
        ".." => return Ok(dir.parent().unwrap_or_else(|| dir.clone())),
        _ => {}
    }

    let dentry = Dentry::alloc(dir, name);
    inode.i_op()?.lookup(&inode, &dentry)?;
    Ok(dentry)
}

/// 从 `root` 开始逐级解析 `path`
///
/// 绝对路径与相对路径都相对 `root` 解析，`..` 不会越过 `root`。
/// 任一级不存在时返回 [`FsError::NotFound`]。
pub fn vfs_walk(root: &Arc<Dentry>, path: &str) -> Result<Arc<Dentry>, FsError> {
    let mut current = root.clone();
    for component in parse_path(path) {
        current = match component {
            PathComponent::Root => root.clone(),
            PathComponent::Current => continue,
            PathComponent::Parent => {
                if Arc::ptr_eq(&current, root) {
                    continue;
                }
                current.parent().unwrap_or_else(|| root.clone())
            }
            PathComponent::Normal(name) => {
                let child = vfs_lookup_at(&current, &name)?;
                if child.is_negative() {
                    debug!("walk {}: {} not found", path, name);
                    return Err(FsError::NotFound);
                }
                child
            }
        };
    }
    Ok(current)
}

/// 在目录中创建普通文件，返回新目录项
pub fn vfs_create(dir: &Arc<Dentry>, name: &str, mode: FileMode) -> Result<Arc<Dentry>, FsError> {
    let inode = dir_inode(dir)?;
    let dentry = Dentry::alloc(dir, name);
    inode.i_op()?.create(&inode, &dentry, mode)?;
    Ok(dentry)
}

/// 在目录中创建子目录，返回新目录项
pub fn vfs_mkdir(dir: &Arc<Dentry>, name: &str, mode: FileMode) -> Result<Arc<Dentry>, FsError> {
    let inode = dir_inode(dir)?;
    let dentry = Dentry::alloc(dir, name);
    inode.i_op()?.mkdir(&inode, &dentry, mode)?;
    Ok(dentry)
}

/// 删除目录中的普通文件
pub fn vfs_unlink(dir: &Arc<Dentry>, name: &str) -> Result<(), FsError> {
    let inode = dir_inode(dir)?;
    let dentry = Dentry::alloc(dir, name);
    inode.i_op()?.unlink(&inode, &dentry)
}

/// 删除目录中的子目录
pub fn vfs_rmdir(dir: &Arc<Dentry>, name: &str) -> Result<(), FsError> {
    let inode = dir_inode(dir)?;
    let dentry = Dentry::alloc(dir, name);
    inode.i_op()?.rmdir(&inode, &dentry)
}
