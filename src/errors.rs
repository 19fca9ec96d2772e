use std::fmt;

#[derive(Debug, Clone)]
pub enum WeblocationError {
    UnknownCategory(String),
    Download(String),
    EmptyDataset(String),
    MalformedRow(String),
    LookupMiss(String),
    EnrichmentTransport(String),
    StoreConnection(String),
    StoreOperation(String),
    StorePluginNotFound(String),
    FileOperation(String),
    Serialization(String),
    Config(String),
}

impl WeblocationError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            WeblocationError::UnknownCategory(_) => "E001",
            WeblocationError::Download(_) => "E002",
            WeblocationError::EmptyDataset(_) => "E003",
            WeblocationError::MalformedRow(_) => "E004",
            WeblocationError::LookupMiss(_) => "E005",
            WeblocationError::EnrichmentTransport(_) => "E006",
            WeblocationError::StoreConnection(_) => "E007",
            WeblocationError::StoreOperation(_) => "E008",
            WeblocationError::StorePluginNotFound(_) => "E009",
            WeblocationError::FileOperation(_) => "E010",
            WeblocationError::Serialization(_) => "E011",
            WeblocationError::Config(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            WeblocationError::UnknownCategory(_) => "Unknown Category",
            WeblocationError::Download(_) => "Download Error",
            WeblocationError::EmptyDataset(_) => "Empty Dataset",
            WeblocationError::MalformedRow(_) => "Malformed Row",
            WeblocationError::LookupMiss(_) => "Lookup Miss",
            WeblocationError::EnrichmentTransport(_) => "Enrichment Transport Error",
            WeblocationError::StoreConnection(_) => "Store Connection Error",
            WeblocationError::StoreOperation(_) => "Store Operation Error",
            WeblocationError::StorePluginNotFound(_) => "Store Plugin Not Found",
            WeblocationError::FileOperation(_) => "File Operation Error",
            WeblocationError::Serialization(_) => "Serialization Error",
            WeblocationError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            WeblocationError::UnknownCategory(msg)
            | WeblocationError::Download(msg)
            | WeblocationError::EmptyDataset(msg)
            | WeblocationError::MalformedRow(msg)
            | WeblocationError::LookupMiss(msg)
            | WeblocationError::EnrichmentTransport(msg)
            | WeblocationError::StoreConnection(msg)
            | WeblocationError::StoreOperation(msg)
            | WeblocationError::StorePluginNotFound(msg)
            | WeblocationError::FileOperation(msg)
            | WeblocationError::Serialization(msg)
            | WeblocationError::Config(msg) => msg,
        }
    }

    /// 行级 / 查询级错误：调用方应使用兜底值而不是中止
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WeblocationError::MalformedRow(_)
                | WeblocationError::LookupMiss(_)
                | WeblocationError::EnrichmentTransport(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for WeblocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for WeblocationError {}

// 便捷的构造函数
impl WeblocationError {
    pub fn unknown_category<T: Into<String>>(msg: T) -> Self {
        WeblocationError::UnknownCategory(msg.into())
    }

    pub fn download<T: Into<String>>(msg: T) -> Self {
        WeblocationError::Download(msg.into())
    }

    pub fn empty_dataset<T: Into<String>>(msg: T) -> Self {
        WeblocationError::EmptyDataset(msg.into())
    }

    pub fn malformed_row<T: Into<String>>(msg: T) -> Self {
        WeblocationError::MalformedRow(msg.into())
    }

    pub fn lookup_miss<T: Into<String>>(msg: T) -> Self {
        WeblocationError::LookupMiss(msg.into())
    }

    pub fn enrichment_transport<T: Into<String>>(msg: T) -> Self {
        WeblocationError::EnrichmentTransport(msg.into())
    }

    pub fn store_connection<T: Into<String>>(msg: T) -> Self {
        WeblocationError::StoreConnection(msg.into())
    }

    pub fn store_operation<T: Into<String>>(msg: T) -> Self {
        WeblocationError::StoreOperation(msg.into())
    }

    pub fn store_plugin_not_found<T: Into<String>>(msg: T) -> Self {
        WeblocationError::StorePluginNotFound(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        WeblocationError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        WeblocationError::Serialization(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        WeblocationError::Config(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for WeblocationError {
    fn from(err: std::io::Error) -> Self {
        WeblocationError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for WeblocationError {
    fn from(err: serde_json::Error) -> Self {
        WeblocationError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for WeblocationError {
    fn from(err: csv::Error) -> Self {
        WeblocationError::Serialization(format!("CSV decode failed: {}", err))
    }
}

impl From<zip::result::ZipError> for WeblocationError {
    fn from(err: zip::result::ZipError) -> Self {
        WeblocationError::Download(format!("archive is broken: {}", err))
    }
}

impl From<redis::RedisError> for WeblocationError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout() {
            WeblocationError::StoreConnection(err.to_string())
        } else {
            WeblocationError::StoreOperation(err.to_string())
        }
    }
}

impl From<ureq::Error> for WeblocationError {
    fn from(err: ureq::Error) -> Self {
        WeblocationError::Download(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WeblocationError>;
