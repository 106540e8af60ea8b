//! 用户缓冲区访问
//!
//! 文件系统读写数据时并不直接接触调用者的内存，而是通过
//! [`CopyToUser`] / [`CopyFromUser`] 完成边界拷贝。拷贝失败返回
//! [`FsError::BadAddress`]。

use crate::FsError;

/// 读取方向的目标缓冲区（copy_to_user）
pub trait CopyToUser {
    /// 缓冲区长度
    fn len(&self) -> usize;

    /// 缓冲区是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 把 `src` 拷贝到缓冲区 `offset` 处
    fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), FsError>;
}

/// 写入方向的源缓冲区（copy_from_user）
pub trait CopyFromUser {
    /// 缓冲区长度
    fn len(&self) -> usize;

    /// 缓冲区是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 从缓冲区 `offset` 处拷贝数据填满 `dst`
    fn copy_from_user(&self, offset: usize, dst: &mut [u8]) -> Result<(), FsError>;
}

/// 可写的内存切片
pub struct UserSliceMut<'a> {
    buf: &'a mut [u8],
}

impl<'a> UserSliceMut<'a> {
    /// 包装一个可写切片
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf }
    }
}

impl CopyToUser for UserSliceMut<'_> {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), FsError> {
        let end = offset.checked_add(src.len()).ok_or(FsError::BadAddress)?;
        let dst = self.buf.get_mut(offset..end).ok_or(FsError::BadAddress)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// 只读的内存切片
pub struct UserSlice<'a> {
    buf: &'a [u8],
}

impl<'a> UserSlice<'a> {
    /// 包装一个只读切片
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }
}

impl CopyFromUser for UserSlice<'_> {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn copy_from_user(&self, offset: usize, dst: &mut [u8]) -> Result<(), FsError> {
        let end = offset.checked_add(dst.len()).ok_or(FsError::BadAddress)?;
        let src = self.buf.get(offset..end).ok_or(FsError::BadAddress)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}
