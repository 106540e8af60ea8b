//! 文件抽象层 - 打开的文件与数据操作表
//!
//! [`File`] 是“有状态”的会话对象，维护当前偏移量；
//! 实际的数据读写与目录遍历由文件系统通过 [`FileOperations`] 提供。
//! 读写时偏移量以显式参数传入，文件系统负责推进它。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use sync::SpinLock;

use crate::{
    CopyFromUser, CopyToUser, Dentry, DirEntry, FsError, Inode, InodeType, UserSlice,
    UserSliceMut,
};

/// 目录遍历的接收方（对应 `dir_context`）
///
/// 文件系统每产生一个目录项就调用一次 [`DirContext::emit`]，
/// 接收成功后由文件系统推进 `pos`。
pub trait DirContext {
    /// 当前位置
    fn pos(&self) -> usize;

    /// 设置位置
    fn set_pos(&mut self, pos: usize);

    /// 接收一个目录项，返回 `false` 表示无法继续接收
    fn emit(&mut self, name: &str, ino: usize, inode_type: InodeType) -> bool;
}

/// 把目录项收集到 `Vec` 的接收方，可以限制单次接收的数量
#[derive(Debug, Default)]
pub struct DirEntryCollector {
    pos: usize,
    limit: Option<usize>,
    entries: Vec<DirEntry>,
}

impl DirEntryCollector {
    /// 从位置 0 开始、不限数量
    pub fn new() -> Self {
        Self::default()
    }

    /// 从指定位置开始、最多接收 `limit` 项
    pub fn with_limit(pos: usize, limit: usize) -> Self {
        Self {
            pos,
            limit: Some(limit),
            entries: Vec::new(),
        }
    }

    /// 已接收的目录项
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// 取出已接收的目录项
    pub fn into_entries(self) -> Vec<DirEntry> {
        self.entries
    }
}

impl DirContext for DirEntryCollector {
    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn emit(&mut self, name: &str, ino: usize, inode_type: InodeType) -> bool {
        if self.limit.is_some_and(|limit| self.entries.len() >= limit) {
            return false;
        }
        self.entries.push(DirEntry {
            name: String::from(name),
            inode_no: ino,
            inode_type,
        });
        true
    }
}

/// 数据操作表（对应 `file_operations`）
pub trait FileOperations: Send + Sync {
    /// 遍历目录，返回遍历结束时的位置
    fn iterate(&self, _file: &File, _ctx: &mut dyn DirContext) -> Result<usize, FsError> {
        Err(FsError::NotDirectory)
    }

    /// 从 `offset` 读取数据到 `buf`，成功后推进 `offset`
    fn read(
        &self,
        file: &File,
        buf: &mut dyn CopyToUser,
        offset: &mut usize,
    ) -> Result<usize, FsError>;

    /// 把 `buf` 写入 `offset`，成功后推进 `offset`
    fn write(
        &self,
        file: &File,
        buf: &dyn CopyFromUser,
        offset: &mut usize,
    ) -> Result<usize, FsError>;
}

/// 打开的文件
pub struct File {
    dentry: Arc<Dentry>,
    inode: Arc<Inode>,
    pos: SpinLock<usize>,
}

impl File {
    /// 打开目录项；负目录项返回 [`FsError::NotFound`]
    pub fn open(dentry: Arc<Dentry>) -> Result<Arc<File>, FsError> {
        let inode = dentry.inode().ok_or(FsError::NotFound)?;
        Ok(Arc::new(Self {
            dentry,
            inode,
            pos: SpinLock::new(0),
        }))
    }

    /// 目录项
    pub fn dentry(&self) -> &Arc<Dentry> {
        &self.dentry
    }

    /// Inode
    pub fn inode(&self) -> &Arc<Inode> {
        &self.inode
    }

    /// 当前偏移量
    pub fn pos(&self) -> usize {
        *self.pos.lock()
    }

    /// 设置偏移量
    pub fn seek(&self, pos: usize) {
        *self.pos.lock() = pos;
    }
}

/// 从当前偏移量读取，并推进偏移量
pub fn vfs_read(file: &File, buf: &mut [u8]) -> Result<usize, FsError> {
    vfs_read_user(file, &mut UserSliceMut::new(buf))
}

/// 从当前偏移量读取到任意用户缓冲区，并推进偏移量
pub fn vfs_read_user(file: &File, buf: &mut dyn CopyToUser) -> Result<usize, FsError> {
    let fop = file.inode.i_fop()?;
    let mut offset = file.pos();
    let n = fop.read(file, buf, &mut offset)?;
    file.seek(offset);
    Ok(n)
}

/// 从指定偏移量读取，不改变文件偏移量
pub fn vfs_pread(file: &File, buf: &mut [u8], offset: usize) -> Result<usize, FsError> {
    let fop = file.inode.i_fop()?;
    let mut offset = offset;
    fop.read(file, &mut UserSliceMut::new(buf), &mut offset)
}

/// 写入当前偏移量，并推进偏移量
pub fn vfs_write(file: &File, buf: &[u8]) -> Result<usize, FsError> {
    vfs_write_user(file, &UserSlice::new(buf))
}

/// 从任意用户缓冲区写入当前偏移量，并推进偏移量
pub fn vfs_write_user(file: &File, buf: &dyn CopyFromUser) -> Result<usize, FsError> {
    let fop = file.inode.i_fop()?;
    let mut offset = file.pos();
    let n = fop.write(file, buf, &mut offset)?;
    file.seek(offset);
    Ok(n)
}

/// 写入指定偏移量，不改变文件偏移量
pub fn vfs_pwrite(file: &File, buf: &[u8], offset: usize) -> Result<usize, FsError> {
    let fop = file.inode.i_fop()?;
    let mut offset = offset;
    fop.write(file, &UserSlice::new(buf), &mut offset)
}

/// 调用一次目录遍历，返回结束位置
pub fn iterate_dir(file: &File, ctx: &mut dyn DirContext) -> Result<usize, FsError> {
    if !file.inode.is_dir() {
        return Err(FsError::NotDirectory);
    }
    file.inode.i_fop()?.iterate(file, ctx)
}

/// 读取完整目录内容（含 `.` 与 `..`）
pub fn read_dir(file: &File) -> Result<Vec<DirEntry>, FsError> {
    let mut ctx = DirEntryCollector::new();
    iterate_dir(file, &mut ctx)?;
    Ok(ctx.into_entries())
}

/// 以每批最多 `batch` 项的方式反复遍历目录，直到不再产生新目录项
///
/// 接收方装满时文件系统返回 [`FsError::ResourceExhausted`]，
/// 此时从接收方记录的位置继续下一批。
pub fn read_dir_batched(file: &File, batch: usize) -> Result<Vec<DirEntry>, FsError> {
    if batch == 0 {
        return Err(FsError::InvalidArgument);
    }

    let mut entries = Vec::new();
    let mut pos = 0;
    loop {
        let mut ctx = DirEntryCollector::with_limit(pos, batch);
        let result = iterate_dir(file, &mut ctx);
        pos = ctx.pos();
        let emitted = ctx.into_entries();
        let done = emitted.is_empty();
        entries.extend(emitted);

        match result {
            Ok(_) if done => return Ok(entries),
            Ok(_) => continue,
            Err(FsError::ResourceExhausted) if !done => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_limit() {
        let mut ctx = DirEntryCollector::with_limit(4, 2);
        assert_eq!(ctx.pos(), 4);
        assert!(ctx.emit("a", 1, InodeType::File));
        assert!(ctx.emit("b", 2, InodeType::Directory));
        assert!(!ctx.emit("c", 3, InodeType::File));
        assert_eq!(ctx.entries().len(), 2);
        assert_eq!(ctx.entries()[1].name, "b");
    }

    #[test]
    fn test_collector_unlimited() {
        let mut ctx = DirEntryCollector::new();
        for i in 0..100 {
            assert!(ctx.emit("x", i, InodeType::File));
        }
        assert_eq!(ctx.into_entries().len(), 100);
    }
}
