//! VTFS 操作表
//!
//! 宿主通过 inode 上绑定的 [`VtfsInodeOps`] / [`VtfsFileOps`] 调用进来；
//! 操作表从超级块取出本次挂载的 [`Vtfs`]，在其读写锁下访问元数据存储。

use alloc::sync::Arc;
use alloc::vec::Vec;

use log::{debug, error, info};
use vfs::{
    CopyFromUser, CopyToUser, Dentry, DirContext, File, FileMode, FileOperations, FsError, Inode,
    InodeOperations, SuperBlock,
};

use crate::factory::{vtfs_get_inode, vtfs_iget};
use crate::node::{NodeKind, Owner};
use crate::store::validate_name;
use crate::Vtfs;

/// 名字空间操作表
pub struct VtfsInodeOps;

/// 数据操作表
pub struct VtfsFileOps;

/// 所有 VTFS inode 共用的名字空间操作表
pub static VTFS_INODE_OPS: VtfsInodeOps = VtfsInodeOps;

/// 所有 VTFS inode 共用的数据操作表
pub static VTFS_FILE_OPS: VtfsFileOps = VtfsFileOps;

/// 取出 inode 所属的挂载；已卸载时返回 [`FsError::NoDevice`]
fn vtfs_of(inode: &Inode) -> Result<(Arc<SuperBlock>, Arc<Vtfs>), FsError> {
    let sb = inode.super_block()?;
    let fs = sb.fs_info::<Vtfs>().ok_or(FsError::NoDevice)?;
    Ok((sb, fs))
}

/// create 与 mkdir 的公共路径
fn vtfs_make_node(
    dir: &Arc<Inode>,
    dentry: &Arc<Dentry>,
    mode: FileMode,
    kind: NodeKind,
) -> Result<(), FsError> {
    let (sb, fs) = vtfs_of(dir)?;
    let name = dentry.name();

    // 名字与父目录先在读锁下检查，被拒绝的请求不消耗编号和宿主 inode
    validate_name(name)?;
    match fs.store().lookup(dir.ino(), name) {
        Ok(_) => return Err(FsError::AlreadyExists),
        Err(FsError::NotFound) => {}
        Err(e) => return Err(e),
    }

    let ino = fs.alloc_ino().inspect_err(|_| {
        error!("vtfs: inode numbers exhausted creating {}", name);
    })?;

    let inode = vtfs_get_inode(&sb, Some(dir.as_ref()), mode.with_type(kind.type_bits()), ino)?;

    let inserted = {
        let mut store = fs.store_mut();
        match kind {
            NodeKind::RegularFile => {
                store.create(dir.ino(), name, ino, inode.mode(), Owner::of(&inode))
            }
            NodeKind::Directory => {
                store.mkdir(dir.ino(), name, ino, inode.mode(), Owner::of(&inode))
            }
        }
    };
    // 失败时 inode 随作用域释放，宿主侧不留痕迹
    if let Err(e) = inserted {
        if e == FsError::OutOfMemory {
            error!("vtfs: out of memory creating {}", name);
        } else {
            debug!("vtfs: create {} in {} failed: {:?}", name, dir.ino(), e);
        }
        return Err(e);
    }

    if kind == NodeKind::Directory {
        dir.inc_nlink();
        info!("vtfs: directory {} created (inode: {})", name, ino);
    } else {
        info!("vtfs: file {} created (inode: {})", name, ino);
    }
    dentry.d_add(Some(inode));
    dir.touch_mtime();
    Ok(())
}

impl InodeOperations for VtfsInodeOps {
    fn lookup(&self, dir: &Arc<Inode>, dentry: &Arc<Dentry>) -> Result<(), FsError> {
        let (sb, fs) = vtfs_of(dir)?;
        let found = fs.store().lookup(dir.ino(), dentry.name());
        match found {
            Ok(node) => {
                debug!("vtfs: lookup {} in {} -> {}", dentry.name(), dir.ino(), node.ino);
                dentry.d_add(Some(vtfs_iget(&sb, &node)?));
            }
            Err(FsError::NotFound) => {
                debug!("vtfs: lookup {} in {} -> negative", dentry.name(), dir.ino());
                dentry.d_add(None);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn create(
        &self,
        dir: &Arc<Inode>,
        dentry: &Arc<Dentry>,
        mode: FileMode,
    ) -> Result<(), FsError> {
        vtfs_make_node(dir, dentry, mode, NodeKind::RegularFile)
    }

    fn mkdir(
        &self,
        dir: &Arc<Inode>,
        dentry: &Arc<Dentry>,
        mode: FileMode,
    ) -> Result<(), FsError> {
        vtfs_make_node(dir, dentry, mode, NodeKind::Directory)
    }

    fn unlink(&self, dir: &Arc<Inode>, dentry: &Arc<Dentry>) -> Result<(), FsError> {
        let (_, fs) = vtfs_of(dir)?;
        fs.store_mut().unlink(dir.ino(), dentry.name())?;
        dentry.d_add(None);
        dir.touch_mtime();
        debug!("vtfs: unlinked {} from {}", dentry.name(), dir.ino());
        Ok(())
    }

    fn rmdir(&self, dir: &Arc<Inode>, dentry: &Arc<Dentry>) -> Result<(), FsError> {
        let (_, fs) = vtfs_of(dir)?;
        let removed = fs.store_mut().rmdir(dir.ino(), dentry.name());
        if let Err(e) = removed {
            debug!("vtfs: rmdir {} in {} failed: {:?}", dentry.name(), dir.ino(), e);
            return Err(e);
        }
        dentry.d_add(None);
        dir.drop_nlink();
        dir.touch_mtime();
        info!("vtfs: directory {} removed", dentry.name());
        Ok(())
    }
}

impl FileOperations for VtfsFileOps {
    fn iterate(&self, file: &File, ctx: &mut dyn DirContext) -> Result<usize, FsError> {
        let inode = file.inode();
        let (_, fs) = vtfs_of(inode)?;
        let listing = fs.store().listing(inode.ino())?;
        let pos = listing.emit(ctx)?;
        inode.touch_atime();
        Ok(pos)
    }

    fn read(
        &self,
        file: &File,
        buf: &mut dyn CopyToUser,
        offset: &mut usize,
    ) -> Result<usize, FsError> {
        let inode = file.inode();
        let (_, fs) = vtfs_of(inode)?;
        let data = fs.store().read(inode.ino(), *offset, buf.len())?;
        if !data.is_empty() {
            buf.copy_to_user(0, &data)?;
        }
        *offset += data.len();
        inode.touch_atime();
        Ok(data.len())
    }

    fn write(
        &self,
        file: &File,
        buf: &dyn CopyFromUser,
        offset: &mut usize,
    ) -> Result<usize, FsError> {
        let inode = file.inode();
        let (_, fs) = vtfs_of(inode)?;

        let len = buf.len();
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| FsError::OutOfMemory)?;
        bytes.resize(len, 0);
        if len > 0 {
            buf.copy_from_user(0, &mut bytes)?;
        }

        let size = {
            let mut store = fs.store_mut();
            store.write(inode.ino(), *offset, &bytes)?;
            store.stat(inode.ino())?.size
        };
        *offset += len;
        inode.set_size(size);
        inode.touch_mtime();
        Ok(len)
    }
}
