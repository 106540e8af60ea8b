//! 目录遍历接收方

use alloc::string::String;
use alloc::vec::Vec;

use vfs::{DirContext, InodeType};

/// 记录每个目录项被接收时的位置，并可在指定位置拒绝接收
#[derive(Debug, Default)]
pub struct RecordingDirContext {
    pos: usize,
    refuse_at: Option<usize>,
    /// 已接收的 (名字, inode 编号, 接收时的位置)
    pub seen: Vec<(String, usize, usize)>,
}

impl RecordingDirContext {
    /// 从 `pos` 开始，不拒绝
    pub fn new(pos: usize) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }

    /// 从 `pos` 开始，到达位置 `refuse_at` 时拒绝接收
    pub fn refusing_at(pos: usize, refuse_at: usize) -> Self {
        Self {
            pos,
            refuse_at: Some(refuse_at),
            seen: Vec::new(),
        }
    }

    /// 已接收的名字
    pub fn names(&self) -> Vec<&str> {
        self.seen.iter().map(|(name, _, _)| name.as_str()).collect()
    }
}

impl DirContext for RecordingDirContext {
    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn emit(&mut self, name: &str, ino: usize, _inode_type: InodeType) -> bool {
        if self.refuse_at == Some(self.pos) {
            return false;
        }
        self.seen.push((String::from(name), ino, self.pos));
        true
    }
}
