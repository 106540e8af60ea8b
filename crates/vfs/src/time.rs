//! 时间戳类型

/// 秒 + 纳秒形式的时间戳
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSpec {
    /// 秒
    pub tv_sec: i64,
    /// 纳秒
    pub tv_nsec: i64,
}

impl TimeSpec {
    /// 零时间戳
    pub const ZERO: TimeSpec = TimeSpec::new(0, 0);

    /// 创建时间戳
    pub const fn new(tv_sec: i64, tv_nsec: i64) -> Self {
        Self { tv_sec, tv_nsec }
    }
}
