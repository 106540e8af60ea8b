//! 目录项
//!
//! [`Dentry`] 把一个名字绑定到父目录项下的 inode。
//! 查找失败时目录项依然存在，但不指向任何 inode（负目录项）。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use sync::SpinLock;

use crate::Inode;

/// 目录项
pub struct Dentry {
    /// 名字
    name: String,
    /// 父目录项（根目录为空）
    parent: Option<Arc<Dentry>>,
    /// 绑定的 inode，`None` 表示负目录项
    inode: SpinLock<Option<Arc<Inode>>>,
}

impl Dentry {
    /// 为根 inode 创建根目录项
    pub fn new_root(inode: Arc<Inode>) -> Arc<Self> {
        Arc::new(Self {
            name: String::from("/"),
            parent: None,
            inode: SpinLock::new(Some(inode)),
        })
    }

    /// 在父目录项下分配一个尚未绑定 inode 的目录项
    pub fn alloc(parent: &Arc<Dentry>, name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: String::from(name),
            parent: Some(parent.clone()),
            inode: SpinLock::new(None),
        })
    }

    /// 把 inode 绑定到目录项（`None` 表示负目录项）
    pub fn d_add(&self, inode: Option<Arc<Inode>>) {
        *self.inode.lock() = inode;
    }

    /// 名字
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 绑定的 inode
    pub fn inode(&self) -> Option<Arc<Inode>> {
        self.inode.lock().clone()
    }

    /// 是否为负目录项
    pub fn is_negative(&self) -> bool {
        self.inode.lock().is_none()
    }

    /// 父目录项
    pub fn parent(&self) -> Option<Arc<Dentry>> {
        self.parent.clone()
    }

    /// 从根开始的完整路径
    pub fn full_path(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.push(self.name.clone());
        let mut current = self.parent();
        while let Some(dentry) = current {
            if dentry.parent.is_some() {
                parts.push(dentry.name.clone());
            }
            current = dentry.parent();
        }

        if self.parent.is_none() {
            return String::from("/");
        }

        let mut path = String::new();
        for part in parts.iter().rev() {
            path.push('/');
            path.push_str(part);
        }
        path
    }
}

impl core::fmt::Debug for Dentry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dentry")
            .field("name", &self.name)
            .field("negative", &self.is_negative())
            .finish()
    }
}
