//! 节点与目录项
//!
//! [`Node`] 保存一个文件或目录的元数据；普通文件另有一块固定容量、
//! 初始全零的数据缓冲区。[`Entry`] 把节点挂到父目录下的某个名字上。

use alloc::string::String;
use alloc::vec::Vec;

use vfs::{FileMode, FsError, Inode, InodeType};

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// 目录
    Directory,
    /// 普通文件
    RegularFile,
}

impl NodeKind {
    /// 对应的模式类型位
    pub fn type_bits(self) -> FileMode {
        match self {
            NodeKind::Directory => FileMode::S_IFDIR,
            NodeKind::RegularFile => FileMode::S_IFREG,
        }
    }

    /// 对应的宿主文件类型
    pub fn inode_type(self) -> InodeType {
        match self {
            NodeKind::Directory => InodeType::Directory,
            NodeKind::RegularFile => InodeType::File,
        }
    }
}

/// 节点所有者
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Owner {
    /// 用户 ID
    pub uid: u32,
    /// 组 ID
    pub gid: u32,
}

impl Owner {
    /// 取宿主 inode 上已经初始化好的所有者
    pub fn of(inode: &Inode) -> Self {
        let meta = inode.metadata();
        Self {
            uid: meta.uid,
            gid: meta.gid,
        }
    }
}

/// 查找结果：节点元数据的快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// 节点编号
    pub ino: usize,
    /// 模式（含类型位）
    pub mode: FileMode,
    /// 节点类型
    pub kind: NodeKind,
    /// 数据大小（目录为 0）
    pub size: usize,
    /// 所有者
    pub owner: Owner,
    /// 直接子目录个数，由存储填写
    pub subdirs: usize,
}

/// 节点
#[derive(Debug)]
pub struct Node {
    ino: usize,
    mode: FileMode,
    kind: NodeKind,
    size: usize,
    owner: Owner,
    /// 普通文件的数据缓冲区，长度即容量；目录为空
    data: Vec<u8>,
}

impl Node {
    /// 创建普通文件节点，数据缓冲区按 `capacity` 一次分配并清零
    pub fn new_file(
        ino: usize,
        mode: FileMode,
        owner: Owner,
        capacity: usize,
    ) -> Result<Self, FsError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| FsError::OutOfMemory)?;
        data.resize(capacity, 0);

        Ok(Self {
            ino,
            mode: mode.with_type(FileMode::S_IFREG),
            kind: NodeKind::RegularFile,
            size: 0,
            owner,
            data,
        })
    }

    /// 创建目录节点
    pub fn new_dir(ino: usize, mode: FileMode, owner: Owner) -> Self {
        Self {
            ino,
            mode: mode.with_type(FileMode::S_IFDIR),
            kind: NodeKind::Directory,
            size: 0,
            owner,
            data: Vec::new(),
        }
    }

    /// 节点编号
    pub fn ino(&self) -> usize {
        self.ino
    }

    /// 模式（含类型位）
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// 节点类型
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// 数据大小
    pub fn size(&self) -> usize {
        self.size
    }

    /// 数据缓冲区容量（目录为 0）
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// 元数据快照
    pub fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            ino: self.ino,
            mode: self.mode,
            kind: self.kind,
            size: self.size,
            owner: self.owner,
            subdirs: 0,
        }
    }

    /// 读取 `[offset, offset + len)` 与有效数据的交集
    pub fn read_at(&self, offset: usize, len: usize) -> Result<Vec<u8>, FsError> {
        if self.is_dir() {
            return Err(FsError::IsDirectory);
        }
        if offset >= self.size {
            return Ok(Vec::new());
        }

        let n = len.min(self.size - offset);
        let mut out = Vec::new();
        out.try_reserve_exact(n).map_err(|_| FsError::OutOfMemory)?;
        out.extend_from_slice(&self.data[offset..offset + n]);
        Ok(out)
    }

    /// 把 `bytes` 写到 `offset`，超出容量时不写入任何数据
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<usize, FsError> {
        if self.is_dir() {
            return Err(FsError::IsDirectory);
        }
        let end = offset
            .checked_add(bytes.len())
            .ok_or(FsError::FileTooLarge)?;
        if end > self.capacity() {
            return Err(FsError::FileTooLarge);
        }

        self.data[offset..end].copy_from_slice(bytes);
        self.size = self.size.max(end);
        Ok(bytes.len())
    }
}

/// 目录项：父目录下的一个名字及其拥有的节点
#[derive(Debug)]
pub struct Entry {
    /// 父目录节点编号
    pub parent_ino: usize,
    /// 名字，同一父目录下唯一
    pub name: String,
    /// 节点
    pub node: Node,
}
