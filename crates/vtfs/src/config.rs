//! 挂载参数
//!
//! 挂载数据是逗号分隔的 `key=value` 列表，例如
//! `capacity=4096,first_ino=1,root_mode=755,max_inodes=64`。
//! 未知的键或非法的值都返回 [`FsError::InvalidArgument`]。

use vfs::{FileMode, FsError};

/// 每个普通文件数据缓冲区的默认容量（字节）
pub const DEFAULT_CAPACITY: usize = 1024;
/// 数据缓冲区容量上限（字节）
pub const MAX_CAPACITY: usize = 65536;
/// 根目录默认使用的 inode 编号，后续编号依次递增
pub const DEFAULT_FIRST_INO: usize = 100;
/// 根目录默认权限
pub const DEFAULT_ROOT_MODE: u32 = 0o777;
/// 文件名最大长度（字节）
pub const MAX_NAME_LEN: usize = 255;

/// 一次挂载的配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VtfsConfig {
    /// 普通文件数据缓冲区容量（字节）
    pub capacity: usize,
    /// 第一个 inode 编号（分给根目录）
    pub first_ino: usize,
    /// 根目录权限位
    pub root_mode: FileMode,
    /// 宿主 inode 对象上限，0 表示无限制
    pub max_inodes: usize,
}

impl Default for VtfsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            first_ino: DEFAULT_FIRST_INO,
            root_mode: FileMode::from_bits_truncate(DEFAULT_ROOT_MODE),
            max_inodes: 0,
        }
    }
}

impl VtfsConfig {
    /// 设置数据缓冲区容量
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// 设置第一个 inode 编号
    pub fn with_first_ino(mut self, first_ino: usize) -> Self {
        self.first_ino = first_ino;
        self
    }

    /// 设置根目录权限
    pub fn with_root_mode(mut self, root_mode: FileMode) -> Self {
        self.root_mode = root_mode.permissions();
        self
    }

    /// 设置宿主 inode 对象上限
    pub fn with_max_inodes(mut self, max_inodes: usize) -> Self {
        self.max_inodes = max_inodes;
        self
    }

    /// 检查取值范围
    ///
    /// 根目录占用 `first_ino`，之后至少还要能分配一个编号。
    pub fn validate(&self) -> Result<(), FsError> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(FsError::InvalidArgument);
        }
        if self.first_ino == 0 || self.first_ino > usize::MAX - 2 {
            return Err(FsError::InvalidArgument);
        }
        Ok(())
    }

    /// 解析挂载数据
    ///
    /// 空字符串得到默认配置；同一个键出现多次时以最后一次为准。
    pub fn parse(data: &str) -> Result<Self, FsError> {
        let mut config = Self::default();

        for option in data.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = option.split_once('=').ok_or(FsError::InvalidArgument)?;
            let value = value.trim();
            match key.trim() {
                "capacity" => config.capacity = parse_number(value)?,
                "first_ino" => config.first_ino = parse_number(value)?,
                "max_inodes" => config.max_inodes = parse_number(value)?,
                "root_mode" => {
                    let bits =
                        u32::from_str_radix(value, 8).map_err(|_| FsError::InvalidArgument)?;
                    if bits & !0o7777 != 0 {
                        return Err(FsError::InvalidArgument);
                    }
                    config.root_mode = FileMode::from_bits_truncate(bits);
                }
                _ => return Err(FsError::InvalidArgument),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_number(value: &str) -> Result<usize, FsError> {
    value.parse::<usize>().map_err(|_| FsError::InvalidArgument)
}
