//! # VTFS
//!
//! 一个完全驻留在内存中的简单文件系统，通过宿主 VFS 层的操作表接入。
//!
//! 每次挂载拥有独立的 [`MetadataStore`]：节点按 `(父目录编号, 名字)` 登记在
//! 一个有序列表中，普通文件的数据保存在固定容量的缓冲区里。
//!
//! ## 使用
//!
//! ```ignore
//! vtfs::init()?;
//! let mount = vfs::mount_fs("vtfs", "capacity=1024")?;
//! let root = mount.root()?;
//! let docs = vfs::vfs_mkdir(&root, "docs", FileMode::from_bits_truncate(0o755))?;
//! ```
//!
//! ## 并发
//!
//! 每次挂载一把读写锁：create/mkdir/unlink/rmdir/write 持写锁，
//! lookup/read 持读锁；目录遍历在读锁内生成快照，释放锁后再交给接收方。

#![no_std]

extern crate alloc;

pub mod config;
pub mod factory;
pub mod fs_type;
pub mod node;
pub mod ops;
pub mod store;

use alloc::sync::Arc;

use log::{error, info};
use vfs::{FsError, register_filesystem, unregister_filesystem};

pub use config::VtfsConfig;
pub use factory::{InoAllocator, vtfs_get_inode, vtfs_iget};
pub use fs_type::{VTFS_NAME, Vtfs, VtfsFsType, vtfs_fill_super, vtfs_kill_sb};
pub use node::{Entry, Node, NodeDescriptor, NodeKind, Owner};
pub use ops::{VTFS_FILE_OPS, VTFS_INODE_OPS, VtfsFileOps, VtfsInodeOps};
pub use store::{Listing, MetadataStore, validate_name};

/// 向宿主注册 VTFS 文件系统类型
///
/// 重复注册返回 [`FsError::AlreadyExists`]。
pub fn init() -> Result<(), FsError> {
    if let Err(e) = register_filesystem(Arc::new(VtfsFsType)) {
        error!("vtfs: failed to register filesystem: {}", e);
        return Err(e);
    }
    info!("vtfs: joined the host");
    Ok(())
}

/// 注销 VTFS 文件系统类型
///
/// 未注册时返回 [`FsError::NotFound`]。
pub fn exit() -> Result<(), FsError> {
    if let Err(e) = unregister_filesystem(VTFS_NAME) {
        error!("vtfs: failed to unregister filesystem: {}", e);
        return Err(e);
    }
    info!("vtfs: left the host");
    Ok(())
}
