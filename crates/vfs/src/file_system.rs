//! 文件系统类型注册与挂载
//!
//! 具体文件系统通过 [`register_filesystem`] 把自己的 [`FileSystemType`]
//! 加入全局表；宿主按名字挂载，得到 [`Mount`]。

use alloc::sync::Arc;
use alloc::vec::Vec;

use lazy_static::lazy_static;
use log::{info, warn};
use sync::RwLock;

use crate::{Dentry, FsError, SuperBlock};

/// 文件系统类型
///
/// 所有文件系统实现都必须实现此 trait
pub trait FileSystemType: Send + Sync {
    /// 文件系统类型名称
    fn name(&self) -> &'static str;

    /// 挂载：解析挂载参数，创建并填充超级块
    fn mount(&self, data: &str) -> Result<Arc<SuperBlock>, FsError>;

    /// 卸载：丢弃该超级块上的全部状态
    fn kill_sb(&self, sb: &Arc<SuperBlock>);
}

lazy_static! {
    // NOTE: 只在模块加载/卸载时有写操作，挂载时均为读操作
    /// 全局文件系统类型表
    static ref FILE_SYSTEMS: RwLock<Vec<Arc<dyn FileSystemType>>> = RwLock::new(Vec::new());
}

/// 注册文件系统类型；同名类型已存在时返回 [`FsError::AlreadyExists`]
pub fn register_filesystem(fs_type: Arc<dyn FileSystemType>) -> Result<(), FsError> {
    let mut table = FILE_SYSTEMS.write();
    if table.iter().any(|t| t.name() == fs_type.name()) {
        warn!("filesystem type {} already registered", fs_type.name());
        return Err(FsError::AlreadyExists);
    }
    info!("registered filesystem type {}", fs_type.name());
    table.push(fs_type);
    Ok(())
}

/// 注销文件系统类型；不存在时返回 [`FsError::NotFound`]
pub fn unregister_filesystem(name: &str) -> Result<(), FsError> {
    let mut table = FILE_SYSTEMS.write();
    let index = table
        .iter()
        .position(|t| t.name() == name)
        .ok_or(FsError::NotFound)?;
    table.remove(index);
    info!("unregistered filesystem type {}", name);
    Ok(())
}

/// 按名字查找已注册的文件系统类型
pub fn get_filesystem(name: &str) -> Option<Arc<dyn FileSystemType>> {
    FILE_SYSTEMS.read().iter().find(|t| t.name() == name).cloned()
}

/// 一次挂载
pub struct Mount {
    fs_type: Arc<dyn FileSystemType>,
    sb: Arc<SuperBlock>,
}

impl Mount {
    /// 超级块
    pub fn super_block(&self) -> &Arc<SuperBlock> {
        &self.sb
    }

    /// 根目录项
    pub fn root(&self) -> Result<Arc<Dentry>, FsError> {
        self.sb.root().ok_or(FsError::NoDevice)
    }

    /// 卸载
    pub fn umount(self) {
        self.fs_type.kill_sb(&self.sb);
    }
}

/// 用给定的文件系统类型挂载
pub fn mount_with(fs_type: Arc<dyn FileSystemType>, data: &str) -> Result<Mount, FsError> {
    let sb = fs_type.mount(data)?;
    Ok(Mount { fs_type, sb })
}

/// 按名字挂载已注册的文件系统类型；类型未注册时返回 [`FsError::NoDevice`]
pub fn mount_fs(name: &str, data: &str) -> Result<Mount, FsError> {
    let fs_type = get_filesystem(name).ok_or(FsError::NoDevice)?;
    mount_with(fs_type, data)
}
