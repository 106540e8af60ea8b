//! 宿主虚拟文件系统层
//!
//! 此 crate 定义宿主与具体文件系统之间的接缝：
//!
//! - [`Inode`] / [`Dentry`] / [`File`] / [`SuperBlock`] - 宿主拥有的对象
//! - [`InodeOperations`] / [`FileOperations`] - 文件系统提供的操作表
//! - [`FileSystemType`] - 文件系统类型注册与挂载
//! - [`DirContext`] - 目录遍历的接收方
//! - [`CopyToUser`] / [`CopyFromUser`] - 用户缓冲区拷贝
//! - 路径处理与名字空间操作分派（`vfs_*`）

#![no_std]

extern crate alloc;

pub mod error;
pub mod ops;

mod dentry;
mod file;
mod file_system;
mod inode;
mod namei;
mod path;
mod super_block;
mod time;
mod uaccess;

// Re-export ops
pub use ops::{VfsOps, register_vfs_ops, vfs_ops};

// Re-export error
pub use error::FsError;

// Re-export inode
pub use inode::{DirEntry, FileMode, Inode, InodeMetadata, InodeOperations, InodeType};

// Re-export dentry
pub use dentry::Dentry;

// Re-export file
pub use file::{
    DirContext, DirEntryCollector, File, FileOperations, iterate_dir, read_dir,
    read_dir_batched, vfs_pread, vfs_pwrite, vfs_read, vfs_read_user, vfs_write, vfs_write_user,
};

// Re-export super_block
pub use super_block::SuperBlock;

// Re-export file_system
pub use file_system::{
    FileSystemType, Mount, get_filesystem, mount_fs, mount_with, register_filesystem,
    unregister_filesystem,
};

// Re-export namei
pub use namei::{vfs_create, vfs_lookup_at, vfs_mkdir, vfs_rmdir, vfs_unlink, vfs_walk};

// Re-export path
pub use path::{PathComponent, parse_path};

// Re-export time
pub use time::TimeSpec;

// Re-export uaccess
pub use uaccess::{CopyFromUser, CopyToUser, UserSlice, UserSliceMut};
