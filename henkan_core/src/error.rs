use thiserror::Error;

/// 数据快照加载/解析失败（异步构建路径上报的错误）。
#[derive(Debug, Error)]
pub enum DataError {
    #[error("io 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("第 {line} 行格式错误: {message}")]
    Format { line: usize, message: String },
    #[error("缺少数据文件: {0}")]
    MissingSection(String),
    #[error("缺少 data version")]
    MissingVersion,
    #[error("构建线程在返回结果前退出")]
    BuilderGone,
}

/// 派生对象（converter/predictor/rewriter）构建失败。
///
/// 与 [`DataError`] 的区别：快照本身有效，但据此无法搭出可用的引擎，
/// 安装方收到该错误后必须保持旧资源不动。
#[derive(Debug, Error)]
pub enum InitError {
    #[error("词典为空，无法构建 converter")]
    EmptyDictionary,
}
