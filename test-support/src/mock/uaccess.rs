//! 会失败的用户缓冲区
//!
//! 模拟调用者传入无效地址：长度看起来正常，但任何拷贝都返回
//! [`FsError::BadAddress`]。

use vfs::{CopyFromUser, CopyToUser, FsError};

/// 读取方向的无效目标缓冲区
pub struct FaultyUserBuffer {
    len: usize,
}

impl FaultyUserBuffer {
    /// 声称长度为 `len` 的无效缓冲区
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl CopyToUser for FaultyUserBuffer {
    fn len(&self) -> usize {
        self.len
    }

    fn copy_to_user(&mut self, _offset: usize, _src: &[u8]) -> Result<(), FsError> {
        Err(FsError::BadAddress)
    }
}

/// 写入方向的无效源缓冲区
pub struct FaultyUserSource {
    len: usize,
}

impl FaultyUserSource {
    /// 声称长度为 `len` 的无效缓冲区
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl CopyFromUser for FaultyUserSource {
    fn len(&self) -> usize {
        self.len
    }

    fn copy_from_user(&self, _offset: usize, _dst: &mut [u8]) -> Result<(), FsError> {
        Err(FsError::BadAddress)
    }
}
