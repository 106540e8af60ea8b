#![allow(dead_code)]

use std::sync::Arc;

use vfs::{Dentry, DirEntry, FileMode, Inode, Mount, mount_with};
use vtfs::VtfsFsType;

pub fn mount(data: &str) -> Mount {
    test_support::mock::vfs::init();
    mount_with(Arc::new(VtfsFsType), data).expect("mount vtfs")
}

pub fn file_mode() -> FileMode {
    FileMode::from_bits_truncate(0o644)
}

pub fn dir_mode() -> FileMode {
    FileMode::from_bits_truncate(0o755)
}

pub fn inode_of(dentry: &Arc<Dentry>) -> Arc<Inode> {
    dentry.inode().expect("positive dentry")
}

pub fn names(entries: &[DirEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}
