//! 捕获日志记录的 `log::Log` 实现
//!
//! 同一进程只能安装一次 logger，多个测试共享同一份记录，
//! 断言时应按各自独有的名字过滤。

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::{Level, LevelFilter, Log, Metadata, Record};
use sync::SpinLock;

/// 捕获到的一条日志
#[derive(Debug)]
struct CapturedRecord {
    /// 级别
    level: Level,
    /// 格式化后的消息
    message: String,
}

/// 把日志保存在内存中的 logger
pub struct CaptureLogger {
    records: SpinLock<Vec<CapturedRecord>>,
}

impl CaptureLogger {
    const fn new() -> Self {
        Self {
            records: SpinLock::new(Vec::new()),
        }
    }

    /// 是否存在给定级别、且消息包含 `needle` 的日志
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let message = format!("{}", record.args());
        self.records.lock().push(CapturedRecord {
            level: record.level(),
            message,
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger::new();

/// 安装捕获 logger 并返回它；重复调用返回同一个实例
pub fn install() -> &'static CaptureLogger {
    // 已安装时 set_logger 返回错误，忽略即可
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Trace);
    &LOGGER
}
