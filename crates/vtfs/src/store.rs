//! 元数据存储
//!
//! 每次挂载拥有一个 [`MetadataStore`]：根节点加上一个按插入顺序排列的
//! [`Entry`] 列表。所有查找都是线性扫描，列表顺序即目录遍历顺序。
//! 根节点没有对应的目录项，因此不能被删除。
//!
//! 存储本身不加锁，由 [`crate::Vtfs`] 用一把读写锁保护。

use alloc::string::String;
use alloc::vec::Vec;

use vfs::{DirContext, FileMode, FsError, InodeType};

use crate::config::MAX_NAME_LEN;
use crate::node::{Entry, Node, NodeDescriptor, NodeKind, Owner};

/// 检查新建项的名字
pub fn validate_name(name: &str) -> Result<(), FsError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(FsError::InvalidArgument);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(FsError::NameTooLong);
    }
    Ok(())
}

/// 目录内容的快照
///
/// 在锁内生成，在锁外交给 [`DirContext`]，接收方因此可以重入文件系统。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    ino: usize,
    parent_ino: usize,
    children: Vec<ListingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListingEntry {
    name: String,
    ino: usize,
    inode_type: InodeType,
}

impl Listing {
    /// 子项个数（不含 `.` 与 `..`）
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// 是否没有子项
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// 从 `ctx.pos()` 处继续向接收方输出目录项
    ///
    /// 位置 0 是 `.`，位置 1 是 `..`，之后第 `pos - 2` 个子项。
    /// 每接收一项位置加一；接收方拒绝时立即返回
    /// [`FsError::ResourceExhausted`]，位置停在被拒绝的那一项。
    /// 全部输出后返回最终位置。
    pub fn emit(&self, ctx: &mut dyn DirContext) -> Result<usize, FsError> {
        if ctx.pos() == 0 {
            if !ctx.emit(".", self.ino, InodeType::Directory) {
                return Err(FsError::ResourceExhausted);
            }
            ctx.set_pos(1);
        }
        if ctx.pos() == 1 {
            if !ctx.emit("..", self.parent_ino, InodeType::Directory) {
                return Err(FsError::ResourceExhausted);
            }
            ctx.set_pos(2);
        }

        let skip = ctx.pos() - 2;
        for child in self.children.iter().skip(skip) {
            if !ctx.emit(&child.name, child.ino, child.inode_type) {
                return Err(FsError::ResourceExhausted);
            }
            ctx.set_pos(ctx.pos() + 1);
        }
        Ok(ctx.pos())
    }
}

/// 一次挂载的全部节点
#[derive(Debug)]
pub struct MetadataStore {
    root: Node,
    entries: Vec<Entry>,
    capacity: usize,
}

impl MetadataStore {
    /// 创建只有根目录的存储
    ///
    /// `capacity` 是之后每个普通文件数据缓冲区的容量。
    pub fn new(root_ino: usize, root_mode: FileMode, root_owner: Owner, capacity: usize) -> Self {
        Self {
            root: Node::new_dir(root_ino, root_mode, root_owner),
            entries: Vec::new(),
            capacity,
        }
    }

    /// 根目录节点编号
    pub fn root_ino(&self) -> usize {
        self.root.ino()
    }

    /// 普通文件数据缓冲区容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 目录项个数（不含根目录）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否只剩根目录
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否存在编号为 `ino` 的节点
    pub fn contains(&self, ino: usize) -> bool {
        self.node(ino).is_some()
    }

    /// 节点类型
    pub fn node_kind(&self, ino: usize) -> Option<NodeKind> {
        self.node(ino).map(Node::kind)
    }

    /// 节点元数据
    pub fn stat(&self, ino: usize) -> Result<NodeDescriptor, FsError> {
        self.node(ino)
            .map(|node| self.describe(node))
            .ok_or(FsError::NotFound)
    }

    fn describe(&self, node: &Node) -> NodeDescriptor {
        let mut descriptor = node.descriptor();
        if node.is_dir() {
            descriptor.subdirs = self
                .entries
                .iter()
                .filter(|e| e.parent_ino == node.ino() && e.node.is_dir())
                .count();
        }
        descriptor
    }

    /// 节点的父目录编号（根目录的父目录是自己）
    pub fn parent_of(&self, ino: usize) -> Option<usize> {
        if ino == self.root.ino() {
            return Some(ino);
        }
        self.entries
            .iter()
            .find(|e| e.node.ino() == ino)
            .map(|e| e.parent_ino)
    }

    fn node(&self, ino: usize) -> Option<&Node> {
        if ino == self.root.ino() {
            return Some(&self.root);
        }
        self.entries
            .iter()
            .map(|e| &e.node)
            .find(|node| node.ino() == ino)
    }

    fn node_mut(&mut self, ino: usize) -> Option<&mut Node> {
        if ino == self.root.ino() {
            return Some(&mut self.root);
        }
        self.entries
            .iter_mut()
            .map(|e| &mut e.node)
            .find(|node| node.ino() == ino)
    }

    fn position(&self, parent: usize, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.parent_ino == parent && e.name == name)
    }

    fn check_dir(&self, ino: usize) -> Result<(), FsError> {
        match self.node_kind(ino) {
            Some(NodeKind::Directory) => Ok(()),
            Some(NodeKind::RegularFile) => Err(FsError::NotDirectory),
            None => Err(FsError::NotFound),
        }
    }

    fn has_children(&self, ino: usize) -> bool {
        self.entries.iter().any(|e| e.parent_ino == ino)
    }

    /// 在目录 `parent` 中按名字查找，取第一个匹配项
    pub fn lookup(&self, parent: usize, name: &str) -> Result<NodeDescriptor, FsError> {
        self.check_dir(parent)?;
        self.position(parent, name)
            .map(|i| self.describe(&self.entries[i].node))
            .ok_or(FsError::NotFound)
    }

    /// 生成目录 `dir` 的内容快照
    pub fn listing(&self, dir: usize) -> Result<Listing, FsError> {
        self.check_dir(dir)?;
        let parent_ino = self.parent_of(dir).ok_or(FsError::NotFound)?;

        let mut children = Vec::new();
        for entry in self.entries.iter().filter(|e| e.parent_ino == dir) {
            let mut name = String::new();
            name.try_reserve_exact(entry.name.len())
                .map_err(|_| FsError::OutOfMemory)?;
            name.push_str(&entry.name);
            children
                .try_reserve(1)
                .map_err(|_| FsError::OutOfMemory)?;
            children.push(ListingEntry {
                name,
                ino: entry.node.ino(),
                inode_type: entry.node.kind().inode_type(),
            });
        }

        Ok(Listing {
            ino: dir,
            parent_ino,
            children,
        })
    }

    /// 遍历目录 `dir`，语义见 [`Listing::emit`]
    pub fn iterate(&self, dir: usize, ctx: &mut dyn DirContext) -> Result<usize, FsError> {
        self.listing(dir)?.emit(ctx)
    }

    /// 在目录 `parent` 中创建普通文件
    pub fn create(
        &mut self,
        parent: usize,
        name: &str,
        ino: usize,
        mode: FileMode,
        owner: Owner,
    ) -> Result<NodeDescriptor, FsError> {
        self.insert(parent, name, ino, NodeKind::RegularFile, mode, owner)
    }

    /// 在目录 `parent` 中创建子目录
    pub fn mkdir(
        &mut self,
        parent: usize,
        name: &str,
        ino: usize,
        mode: FileMode,
        owner: Owner,
    ) -> Result<NodeDescriptor, FsError> {
        self.insert(parent, name, ino, NodeKind::Directory, mode, owner)
    }

    fn insert(
        &mut self,
        parent: usize,
        name: &str,
        ino: usize,
        kind: NodeKind,
        mode: FileMode,
        owner: Owner,
    ) -> Result<NodeDescriptor, FsError> {
        validate_name(name)?;
        self.check_dir(parent)?;
        if self.position(parent, name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        if self.contains(ino) {
            return Err(FsError::InvalidArgument);
        }

        // 先完成所有分配，失败时存储保持不变
        let node = match kind {
            NodeKind::RegularFile => Node::new_file(ino, mode, owner, self.capacity)?,
            NodeKind::Directory => Node::new_dir(ino, mode, owner),
        };
        let mut owned = String::new();
        owned
            .try_reserve_exact(name.len())
            .map_err(|_| FsError::OutOfMemory)?;
        owned.push_str(name);
        self.entries
            .try_reserve(1)
            .map_err(|_| FsError::OutOfMemory)?;

        let descriptor = node.descriptor();
        self.entries.push(Entry {
            parent_ino: parent,
            name: owned,
            node,
        });
        Ok(descriptor)
    }

    /// 删除目录 `parent` 中的普通文件
    pub fn unlink(&mut self, parent: usize, name: &str) -> Result<(), FsError> {
        let index = self.position(parent, name).ok_or(FsError::NotFound)?;
        if self.entries[index].node.is_dir() {
            return Err(FsError::IsDirectory);
        }
        self.entries.remove(index);
        Ok(())
    }

    /// 删除目录 `parent` 中的空子目录
    pub fn rmdir(&mut self, parent: usize, name: &str) -> Result<(), FsError> {
        let index = self.position(parent, name).ok_or(FsError::NotFound)?;
        let node = &self.entries[index].node;
        if !node.is_dir() {
            return Err(FsError::NotDirectory);
        }
        if self.has_children(node.ino()) {
            return Err(FsError::DirectoryNotEmpty);
        }
        self.entries.remove(index);
        Ok(())
    }

    /// 从节点 `ino` 的 `offset` 处读取最多 `len` 字节
    pub fn read(&self, ino: usize, offset: usize, len: usize) -> Result<Vec<u8>, FsError> {
        self.node(ino).ok_or(FsError::NotFound)?.read_at(offset, len)
    }

    /// 把 `bytes` 写入节点 `ino` 的 `offset` 处，返回写入的字节数
    pub fn write(&mut self, ino: usize, offset: usize, bytes: &[u8]) -> Result<usize, FsError> {
        self.node_mut(ino)
            .ok_or(FsError::NotFound)?
            .write_at(offset, bytes)
    }

    /// 丢弃除根目录外的全部节点
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use test_support::mock::dir::RecordingDirContext;
    use vfs::DirEntryCollector;

    use super::*;

    const ROOT: usize = 100;

    fn store() -> MetadataStore {
        MetadataStore::new(ROOT, FileMode::from_bits_truncate(0o777), Owner::default(), 16)
    }

    fn mode(bits: u32) -> FileMode {
        FileMode::from_bits_truncate(bits)
    }

    fn names(ctx: &DirEntryCollector) -> Vec<&str> {
        ctx.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_create_then_lookup() {
        let mut s = store();
        let created = s.create(ROOT, "a.txt", 101, mode(0o644), Owner::default()).unwrap();
        let found = s.lookup(ROOT, "a.txt").unwrap();
        assert_eq!(created, found);
        assert_eq!(found.ino, 101);
        assert_eq!(found.kind, NodeKind::RegularFile);
        assert!(found.mode.is_file());
        assert_eq!(found.size, 0);
    }

    #[test]
    fn test_mkdir_then_lookup() {
        let mut s = store();
        s.mkdir(ROOT, "docs", 101, mode(0o755), Owner::default()).unwrap();
        let found = s.lookup(ROOT, "docs").unwrap();
        assert_eq!(found.kind, NodeKind::Directory);
        assert!(found.mode.is_dir());
        assert_eq!(s.parent_of(101), Some(ROOT));
    }

    #[test]
    fn test_stat_counts_subdirs() {
        let mut s = store();
        s.mkdir(ROOT, "a", 101, mode(0o755), Owner::default()).unwrap();
        s.mkdir(ROOT, "b", 102, mode(0o755), Owner::default()).unwrap();
        s.create(ROOT, "f", 103, mode(0o644), Owner::default()).unwrap();
        s.mkdir(101, "nested", 104, mode(0o755), Owner::default()).unwrap();
        assert_eq!(s.stat(ROOT).unwrap().subdirs, 2);
        assert_eq!(s.lookup(ROOT, "a").unwrap().subdirs, 1);
        assert_eq!(s.lookup(ROOT, "f").unwrap().subdirs, 0);
        s.rmdir(101, "nested").unwrap();
        assert_eq!(s.lookup(ROOT, "a").unwrap().subdirs, 0);
    }

    #[test]
    fn test_lookup_is_scoped_to_parent() {
        let mut s = store();
        s.mkdir(ROOT, "d", 101, mode(0o755), Owner::default()).unwrap();
        s.create(101, "x", 102, mode(0o644), Owner::default()).unwrap();
        assert_eq!(s.lookup(ROOT, "x"), Err(FsError::NotFound));
        assert_eq!(s.lookup(101, "x").unwrap().ino, 102);
        assert_eq!(s.lookup(102, "x"), Err(FsError::NotDirectory));
        assert_eq!(s.lookup(999, "x"), Err(FsError::NotFound));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut s = store();
        s.create(ROOT, "a", 101, mode(0o644), Owner::default()).unwrap();
        assert_eq!(
            s.create(ROOT, "a", 102, mode(0o644), Owner::default()),
            Err(FsError::AlreadyExists)
        );
        assert_eq!(
            s.mkdir(ROOT, "a", 103, mode(0o755), Owner::default()),
            Err(FsError::AlreadyExists)
        );
        assert_eq!(s.len(), 1);
        assert!(!s.contains(102));
    }

    #[test]
    fn test_same_name_in_different_dirs() {
        let mut s = store();
        s.mkdir(ROOT, "d", 101, mode(0o755), Owner::default()).unwrap();
        s.create(ROOT, "a", 102, mode(0o644), Owner::default()).unwrap();
        s.create(101, "a", 103, mode(0o644), Owner::default()).unwrap();
        assert_eq!(s.lookup(ROOT, "a").unwrap().ino, 102);
        assert_eq!(s.lookup(101, "a").unwrap().ino, 103);
    }

    #[test]
    fn test_invalid_names() {
        let mut s = store();
        for name in ["", ".", "..", "a/b", "nul\0"] {
            assert_eq!(
                s.create(ROOT, name, 101, mode(0o644), Owner::default()),
                Err(FsError::InvalidArgument),
                "{name:?}"
            );
        }
        let long = "x".repeat(256);
        assert_eq!(
            s.mkdir(ROOT, &long, 101, mode(0o755), Owner::default()),
            Err(FsError::NameTooLong)
        );
        let max = "x".repeat(255);
        assert!(s.create(ROOT, &max, 101, mode(0o644), Owner::default()).is_ok());
    }

    #[test]
    fn test_create_under_file_rejected() {
        let mut s = store();
        s.create(ROOT, "f", 101, mode(0o644), Owner::default()).unwrap();
        assert_eq!(
            s.create(101, "g", 102, mode(0o644), Owner::default()),
            Err(FsError::NotDirectory)
        );
        assert_eq!(
            s.mkdir(500, "g", 102, mode(0o755), Owner::default()),
            Err(FsError::NotFound)
        );
    }

    #[test]
    fn test_unlink() {
        let mut s = store();
        s.create(ROOT, "a", 101, mode(0o644), Owner::default()).unwrap();
        s.mkdir(ROOT, "d", 102, mode(0o755), Owner::default()).unwrap();
        assert_eq!(s.unlink(ROOT, "d"), Err(FsError::IsDirectory));
        assert_eq!(s.unlink(ROOT, "missing"), Err(FsError::NotFound));
        assert_eq!(s.unlink(ROOT, "a"), Ok(()));
        assert_eq!(s.lookup(ROOT, "a"), Err(FsError::NotFound));
        assert!(!s.contains(101));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_rmdir() {
        let mut s = store();
        s.mkdir(ROOT, "d", 101, mode(0o755), Owner::default()).unwrap();
        s.create(101, "a", 102, mode(0o644), Owner::default()).unwrap();
        s.create(ROOT, "f", 103, mode(0o644), Owner::default()).unwrap();

        assert_eq!(s.rmdir(ROOT, "d"), Err(FsError::DirectoryNotEmpty));
        assert_eq!(s.rmdir(ROOT, "f"), Err(FsError::NotDirectory));
        assert_eq!(s.rmdir(ROOT, "nope"), Err(FsError::NotFound));

        s.unlink(101, "a").unwrap();
        assert_eq!(s.rmdir(ROOT, "d"), Ok(()));
        assert_eq!(s.lookup(ROOT, "d"), Err(FsError::NotFound));
    }

    #[test]
    fn test_root_is_not_removable() {
        let mut s = store();
        assert_eq!(s.rmdir(ROOT, "."), Err(FsError::NotFound));
        assert_eq!(s.rmdir(ROOT, ""), Err(FsError::NotFound));
        assert!(s.contains(ROOT));
        assert_eq!(s.node_kind(ROOT), Some(NodeKind::Directory));
    }

    #[test]
    fn test_read_write() {
        let mut s = store();
        s.create(ROOT, "a", 101, mode(0o644), Owner::default()).unwrap();
        assert_eq!(s.write(101, 0, b"hi"), Ok(2));
        assert_eq!(s.read(101, 0, 10).unwrap(), b"hi");
        assert_eq!(s.read(101, 0, 10).unwrap(), b"hi");
        assert_eq!(s.stat(101).unwrap().size, 2);

        assert_eq!(s.write(101, 6, b"!"), Ok(1));
        assert_eq!(s.read(101, 0, 10).unwrap(), b"hi\0\0\0\0!");
        assert!(s.read(101, 7, 10).unwrap().is_empty());
    }

    #[test]
    fn test_read_write_errors() {
        let mut s = store();
        s.create(ROOT, "a", 101, mode(0o644), Owner::default()).unwrap();
        assert_eq!(s.read(999, 0, 1), Err(FsError::NotFound));
        assert_eq!(s.write(999, 0, b"x"), Err(FsError::NotFound));
        assert_eq!(s.read(ROOT, 0, 1), Err(FsError::IsDirectory));
        assert_eq!(s.write(ROOT, 0, b"x"), Err(FsError::IsDirectory));

        s.write(101, 0, b"keep").unwrap();
        assert_eq!(s.write(101, 10, &[1u8; 7]), Err(FsError::FileTooLarge));
        assert_eq!(s.read(101, 0, 16).unwrap(), b"keep");
        assert_eq!(s.stat(101).unwrap().size, 4);
    }

    #[test]
    fn test_iterate_order() {
        let mut s = store();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            s.create(ROOT, name, 101 + i, mode(0o644), Owner::default()).unwrap();
        }
        let mut ctx = DirEntryCollector::new();
        let end = s.iterate(ROOT, &mut ctx).unwrap();
        assert_eq!(names(&ctx), vec![".", "..", "a", "b", "c"]);
        assert_eq!(end, 5);
        assert_eq!(ctx.entries()[0].inode_no, ROOT);
        assert_eq!(ctx.entries()[1].inode_no, ROOT);
        assert_eq!(ctx.entries()[2].inode_type, InodeType::File);

        // 终止位置不再产生任何目录项
        let mut again = DirEntryCollector::with_limit(end, usize::MAX);
        assert_eq!(s.iterate(ROOT, &mut again), Ok(5));
        assert!(again.entries().is_empty());
    }

    #[test]
    fn test_iterate_subdir_dotdot() {
        let mut s = store();
        s.mkdir(ROOT, "d", 101, mode(0o755), Owner::default()).unwrap();
        s.create(101, "in", 102, mode(0o644), Owner::default()).unwrap();
        s.create(ROOT, "out", 103, mode(0o644), Owner::default()).unwrap();

        let mut ctx = DirEntryCollector::new();
        s.iterate(101, &mut ctx).unwrap();
        assert_eq!(names(&ctx), vec![".", "..", "in"]);
        assert_eq!(ctx.entries()[0].inode_no, 101);
        assert_eq!(ctx.entries()[1].inode_no, ROOT);

        assert_eq!(
            s.iterate(103, &mut DirEntryCollector::new()),
            Err(FsError::NotDirectory)
        );
    }

    #[test]
    fn test_iterate_refusal_and_resume() {
        let mut s = store();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            s.create(ROOT, name, 101 + i, mode(0o644), Owner::default()).unwrap();
        }

        let mut ctx = RecordingDirContext::refusing_at(0, 3);
        assert_eq!(s.iterate(ROOT, &mut ctx), Err(FsError::ResourceExhausted));
        assert_eq!(ctx.names(), vec![".", "..", "a"]);
        assert_eq!(ctx.pos(), 3);

        let mut resume = RecordingDirContext::new(ctx.pos());
        assert_eq!(s.iterate(ROOT, &mut resume), Ok(5));
        assert_eq!(resume.names(), vec!["b", "c"]);
        assert_eq!(resume.seen[0].2, 3);
    }

    #[test]
    fn test_iterate_refuses_dots() {
        let s = store();
        let mut ctx = RecordingDirContext::refusing_at(0, 0);
        assert_eq!(s.iterate(ROOT, &mut ctx), Err(FsError::ResourceExhausted));
        assert_eq!(ctx.pos(), 0);

        let mut ctx = RecordingDirContext::refusing_at(0, 1);
        assert_eq!(s.iterate(ROOT, &mut ctx), Err(FsError::ResourceExhausted));
        assert_eq!(ctx.names(), vec!["."]);
        assert_eq!(ctx.pos(), 1);
    }

    #[test]
    fn test_listing_is_a_snapshot() {
        let mut s = store();
        s.create(ROOT, "a", 101, mode(0o644), Owner::default()).unwrap();
        let listing = s.listing(ROOT).unwrap();
        s.unlink(ROOT, "a").unwrap();

        assert_eq!(listing.len(), 1);
        let mut ctx = DirEntryCollector::new();
        listing.emit(&mut ctx).unwrap();
        assert_eq!(names(&ctx), vec![".", "..", "a"]);
    }

    #[test]
    fn test_clear_keeps_root() {
        let mut s = store();
        s.mkdir(ROOT, "d", 101, mode(0o755), Owner::default()).unwrap();
        s.create(101, "a", 102, mode(0o644), Owner::default()).unwrap();
        s.clear();
        assert!(s.is_empty());
        assert!(s.contains(ROOT));
        assert!(!s.contains(101));
    }

    #[test]
    fn test_duplicate_ino_rejected() {
        let mut s = store();
        assert_eq!(
            s.create(ROOT, "a", ROOT, mode(0o644), Owner::default()),
            Err(FsError::InvalidArgument)
        );
        assert!(s.is_empty());
    }
}
