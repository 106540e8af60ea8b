//! Inode 抽象层 - 宿主侧索引节点对象
//!
//! [`Inode`] 对象由宿主通过 [`crate::SuperBlock::new_inode`] 分配，
//! 具体文件系统只负责填写编号、模式、所有者以及操作表。
//! 名字相关的操作（lookup/create/mkdir/unlink/rmdir）通过
//! [`InodeOperations`] 分派到文件系统。

use alloc::string::String;
use alloc::sync::{Arc, Weak};

use sync::SpinLock;

use crate::{Dentry, FileOperations, FsError, SuperBlock, TimeSpec, vfs_ops};

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    /// 普通文件
    File,
    /// 目录
    Directory,
    /// 不支持的类型
    Unknown,
}

impl InodeType {
    /// 根据模式中的类型位推导文件类型
    pub fn from_mode(mode: FileMode) -> Self {
        let fmt = mode & FileMode::S_IFMT;
        if fmt == FileMode::S_IFDIR {
            InodeType::Directory
        } else if fmt == FileMode::S_IFREG {
            InodeType::File
        } else {
            InodeType::Unknown
        }
    }

    /// 转换为 `linux_dirent64::d_type`
    pub fn to_d_type(self) -> u8 {
        match self {
            InodeType::Unknown => 0,  // DT_UNKNOWN
            InodeType::Directory => 4, // DT_DIR
            InodeType::File => 8,     // DT_REG
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// 文件权限和类型（与 POSIX 兼容）
    pub struct FileMode: u32 {
        // 文件类型掩码
        /// 文件类型掩码
        const S_IFMT   = 0o170000;
        /// 普通文件
        const S_IFREG  = 0o100000;
        /// 目录
        const S_IFDIR  = 0o040000;

        // 用户权限
        /// 用户读
        const S_IRUSR  = 0o400;
        /// 用户写
        const S_IWUSR  = 0o200;
        /// 用户执行
        const S_IXUSR  = 0o100;

        // 组权限
        /// 组读
        const S_IRGRP  = 0o040;
        /// 组写
        const S_IWGRP  = 0o020;
        /// 组执行
        const S_IXGRP  = 0o010;

        // 其他用户权限
        /// 其他读
        const S_IROTH  = 0o004;
        /// 其他写
        const S_IWOTH  = 0o002;
        /// 其他执行
        const S_IXOTH  = 0o001;

        // 特殊位
        /// Set UID
        const S_ISUID  = 0o4000;
        /// Set GID
        const S_ISGID  = 0o2000;
        /// Sticky bit
        const S_ISVTX  = 0o1000;
    }
}

impl FileMode {
    /// 去掉类型位后的权限部分
    pub fn permissions(self) -> FileMode {
        self & !FileMode::S_IFMT
    }

    /// 用给定类型位替换原有类型位
    pub fn with_type(self, file_type: FileMode) -> FileMode {
        self.permissions() | (file_type & FileMode::S_IFMT)
    }

    /// 是否为目录
    pub fn is_dir(self) -> bool {
        InodeType::from_mode(self) == InodeType::Directory
    }

    /// 是否为普通文件
    pub fn is_file(self) -> bool {
        InodeType::from_mode(self) == InodeType::File
    }
}

/// 轻量级目录项（目录遍历时返回）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// 文件名
    pub name: String,
    /// Inode 编号
    pub inode_no: usize,
    /// 文件类型
    pub inode_type: InodeType,
}

/// 文件元数据
#[derive(Debug, Clone)]
pub struct InodeMetadata {
    /// Inode 编号
    pub inode_no: usize,
    /// 文件类型
    pub inode_type: InodeType,
    /// 权限位（含类型位）
    pub mode: FileMode,
    /// 用户 ID
    pub uid: u32,
    /// 组 ID
    pub gid: u32,
    /// 文件大小（字节）
    pub size: usize,
    /// 访问时间
    pub atime: TimeSpec,
    /// 修改时间
    pub mtime: TimeSpec,
    /// 状态改变时间
    pub ctime: TimeSpec,
    /// 硬链接数
    pub nlinks: usize,
}

/// 名字空间相关操作表
///
/// `dir` 是父目录的 inode，`dentry` 是待解析/创建/删除的子目录项。
/// 成功的 lookup/create/mkdir 必须通过 [`Dentry::d_add`] 把结果绑定到 `dentry`。
pub trait InodeOperations: Send + Sync {
    /// 在目录中查找子项
    ///
    /// 找不到不算错误：此时 `dentry` 被绑定为负目录项。
    fn lookup(&self, dir: &Arc<Inode>, dentry: &Arc<Dentry>) -> Result<(), FsError>;

    /// 在目录中创建普通文件
    fn create(&self, dir: &Arc<Inode>, dentry: &Arc<Dentry>, mode: FileMode)
    -> Result<(), FsError>;

    /// 在目录中创建子目录
    fn mkdir(&self, dir: &Arc<Inode>, dentry: &Arc<Dentry>, mode: FileMode)
    -> Result<(), FsError>;

    /// 删除普通文件
    fn unlink(&self, dir: &Arc<Inode>, dentry: &Arc<Dentry>) -> Result<(), FsError>;

    /// 删除目录
    fn rmdir(&self, dir: &Arc<Inode>, dentry: &Arc<Dentry>) -> Result<(), FsError>;

    /// 重命名/移动
    fn rename(
        &self,
        _old_dir: &Arc<Inode>,
        _old_dentry: &Arc<Dentry>,
        _new_dir: &Arc<Inode>,
        _new_dentry: &Arc<Dentry>,
    ) -> Result<(), FsError> {
        Err(FsError::NotSupported)
    }

    /// 创建符号链接
    fn symlink(
        &self,
        _dir: &Arc<Inode>,
        _dentry: &Arc<Dentry>,
        _target: &str,
    ) -> Result<(), FsError> {
        Err(FsError::NotSupported)
    }

    /// 创建硬链接
    fn link(
        &self,
        _old_dentry: &Arc<Dentry>,
        _dir: &Arc<Inode>,
        _new_dentry: &Arc<Dentry>,
    ) -> Result<(), FsError> {
        Err(FsError::NotSupported)
    }
}

/// 宿主侧索引节点
///
/// 分配后在共享（放入 `Arc`）之前可通过 `&mut self` 方法初始化编号、所有者和操作表；
/// 共享之后只有元数据可变。
pub struct Inode {
    ino: usize,
    sb: Weak<SuperBlock>,
    metadata: SpinLock<InodeMetadata>,
    i_op: Option<&'static dyn InodeOperations>,
    i_fop: Option<&'static dyn FileOperations>,
}

impl Inode {
    pub(crate) fn new(sb: Weak<SuperBlock>) -> Self {
        let now = vfs_ops().timespec_now();
        Self {
            ino: 0,
            sb,
            metadata: SpinLock::new(InodeMetadata {
                inode_no: 0,
                inode_type: InodeType::Unknown,
                mode: FileMode::empty(),
                uid: 0,
                gid: 0,
                size: 0,
                atime: now,
                mtime: now,
                ctime: now,
                nlinks: 0,
            }),
            i_op: None,
            i_fop: None,
        }
    }

    /// Inode 编号
    pub fn ino(&self) -> usize {
        self.ino
    }

    /// 设置 Inode 编号
    pub fn set_ino(&mut self, ino: usize) {
        self.ino = ino;
        self.metadata.lock().inode_no = ino;
    }

    /// 按当前任务凭据初始化所有者和模式
    ///
    /// 父目录带有 S_ISGID 时继承其组 ID，新建目录同时继承 S_ISGID 位。
    pub fn init_owner(&mut self, dir: Option<&Inode>, mode: FileMode) {
        let ops = vfs_ops();
        let uid = ops.current_fsuid();
        let mut mode = mode;
        let gid = match dir {
            Some(dir) if dir.mode().contains(FileMode::S_ISGID) => {
                if mode.is_dir() {
                    mode |= FileMode::S_ISGID;
                }
                dir.metadata.lock().gid
            }
            _ => ops.current_fsgid(),
        };

        let mut meta = self.metadata.lock();
        meta.uid = uid;
        meta.gid = gid;
        meta.mode = mode;
        meta.inode_type = InodeType::from_mode(mode);
    }

    /// 直接设置所有者与模式（用于恢复已有节点）
    pub fn set_owner(&mut self, uid: u32, gid: u32, mode: FileMode) {
        let mut meta = self.metadata.lock();
        meta.uid = uid;
        meta.gid = gid;
        meta.mode = mode;
        meta.inode_type = InodeType::from_mode(mode);
    }

    /// 绑定操作表
    pub fn set_ops(
        &mut self,
        i_op: &'static dyn InodeOperations,
        i_fop: &'static dyn FileOperations,
    ) {
        self.i_op = Some(i_op);
        self.i_fop = Some(i_fop);
    }

    /// 名字空间操作表
    pub fn i_op(&self) -> Result<&'static dyn InodeOperations, FsError> {
        self.i_op.ok_or(FsError::NotSupported)
    }

    /// 文件操作表
    pub fn i_fop(&self) -> Result<&'static dyn FileOperations, FsError> {
        self.i_fop.ok_or(FsError::NotSupported)
    }

    /// 所属超级块；文件系统已卸载时返回 [`FsError::NoDevice`]
    pub fn super_block(&self) -> Result<Arc<SuperBlock>, FsError> {
        self.sb.upgrade().ok_or(FsError::NoDevice)
    }

    /// 获取文件元数据
    pub fn metadata(&self) -> InodeMetadata {
        self.metadata.lock().clone()
    }

    /// 模式（含类型位）
    pub fn mode(&self) -> FileMode {
        self.metadata.lock().mode
    }

    /// 文件类型
    pub fn inode_type(&self) -> InodeType {
        self.metadata.lock().inode_type
    }

    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        self.inode_type() == InodeType::Directory
    }

    /// 文件大小
    pub fn size(&self) -> usize {
        self.metadata.lock().size
    }

    /// 更新文件大小
    pub fn set_size(&self, size: usize) {
        self.metadata.lock().size = size;
    }

    /// 硬链接数
    pub fn nlinks(&self) -> usize {
        self.metadata.lock().nlinks
    }

    /// 硬链接数加一
    pub fn inc_nlink(&self) {
        self.metadata.lock().nlinks += 1;
    }

    /// 硬链接数减一
    pub fn drop_nlink(&self) {
        let mut meta = self.metadata.lock();
        meta.nlinks = meta.nlinks.saturating_sub(1);
    }

    /// 更新访问时间
    pub fn touch_atime(&self) {
        self.metadata.lock().atime = vfs_ops().timespec_now();
    }

    /// 更新修改时间与状态改变时间
    pub fn touch_mtime(&self) {
        let now = vfs_ops().timespec_now();
        let mut meta = self.metadata.lock();
        meta.mtime = now;
        meta.ctime = now;
    }
}

impl Drop for Inode {
    fn drop(&mut self) {
        if let Some(sb) = self.sb.upgrade() {
            sb.release_inode();
        }
    }
}

impl core::fmt::Debug for Inode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Inode")
            .field("ino", &self.ino)
            .field("metadata", &self.metadata())
            .finish()
    }
}
