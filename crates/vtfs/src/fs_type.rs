//! 文件系统类型与挂载生命周期

use alloc::sync::Arc;

use log::{error, info};
use sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use vfs::{Dentry, FileMode, FileSystemType, FsError, SuperBlock};

use crate::config::VtfsConfig;
use crate::factory::{InoAllocator, vtfs_get_inode};
use crate::node::Owner;
use crate::store::MetadataStore;

/// 文件系统类型名称
pub const VTFS_NAME: &str = "vtfs";

/// 一次挂载的全部状态，保存在超级块的私有数据中
#[derive(Debug)]
pub struct Vtfs {
    config: VtfsConfig,
    inos: InoAllocator,
    store: RwLock<MetadataStore>,
}

impl Vtfs {
    /// 挂载配置
    pub fn config(&self) -> &VtfsConfig {
        &self.config
    }

    /// 以共享方式访问元数据存储
    pub fn store(&self) -> RwLockReadGuard<'_, MetadataStore> {
        self.store.read()
    }

    pub(crate) fn store_mut(&self) -> RwLockWriteGuard<'_, MetadataStore> {
        self.store.write()
    }

    pub(crate) fn alloc_ino(&self) -> Result<usize, FsError> {
        self.inos.alloc()
    }

    /// 下一个将要分配的节点编号
    pub fn next_ino(&self) -> usize {
        self.inos.peek()
    }
}

/// 填充新建的超级块：创建根 inode、根目录项和空的元数据存储
pub fn vtfs_fill_super(sb: &Arc<SuperBlock>, config: VtfsConfig) -> Result<(), FsError> {
    let inos = InoAllocator::new(config.first_ino);
    let root_ino = inos.alloc()?;

    let root = vtfs_get_inode(sb, None, config.root_mode.with_type(FileMode::S_IFDIR), root_ino)
        .inspect_err(|_| error!("vtfs: failed to create a root inode"))?;

    let store = MetadataStore::new(root_ino, root.mode(), Owner::of(&root), config.capacity);
    sb.set_fs_info(Arc::new(Vtfs {
        config,
        inos,
        store: RwLock::new(store),
    }));
    sb.set_root(Dentry::new_root(root));
    Ok(())
}

/// 销毁超级块上的全部状态
pub fn vtfs_kill_sb(sb: &Arc<SuperBlock>) {
    let dropped = match sb.fs_info::<Vtfs>() {
        Some(fs) => {
            let mut store = fs.store_mut();
            let n = store.len();
            store.clear();
            n
        }
        None => 0,
    };
    sb.take_root();
    sb.clear_fs_info();
    info!("vtfs: super block destroyed, {} entries dropped", dropped);
}

/// VTFS 文件系统类型
#[derive(Debug, Default)]
pub struct VtfsFsType;

impl FileSystemType for VtfsFsType {
    fn name(&self) -> &'static str {
        VTFS_NAME
    }

    fn mount(&self, data: &str) -> Result<Arc<SuperBlock>, FsError> {
        let config = VtfsConfig::parse(data)
            .inspect_err(|e| error!("vtfs: bad mount options {:?}: {}", data, e))?;

        let sb = SuperBlock::new(VTFS_NAME, config.max_inodes);
        if let Err(e) = vtfs_fill_super(&sb, config) {
            error!("vtfs: can't mount file system: {}", e);
            return Err(e);
        }

        info!(
            "vtfs: mounted (capacity {} bytes, root inode {})",
            config.capacity, config.first_ino
        );
        Ok(sb)
    }

    fn kill_sb(&self, sb: &Arc<SuperBlock>) {
        vtfs_kill_sb(sb);
    }
}
