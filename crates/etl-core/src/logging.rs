//! tracing을 사용한 로깅 인프라.
//!
//! 이 모듈은 다양한 출력 형식을 지원하는 구조화된 로깅을 제공합니다:
//! - **pretty**: 개발용 사람이 읽기 쉬운 형식
//! - **json**: 운영환경/로그 집계용 JSON 형식
//! - **compact**: 로그 크기를 줄이기 위한 간결한 형식
//!
//! 표준 출력 외에 일 단위로 교체되는 파일 싱크를 함께 설치할 수 있습니다.
//! 컴포넌트는 로거를 직접 들고 있지 않고 `tracing` 이벤트만 발행하므로,
//! 테스트에서는 `tracing::subscriber::with_default`로 자체 subscriber를 주입할 수 있습니다.

use crate::config::LoggingConfig;
use crate::error::LoggingError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 색상이 포함된 사람이 읽기 쉬운 형식 (개발용)
    #[default]
    Pretty,
    /// 로그 집계용 JSON 형식 (운영용)
    Json,
    /// 간결한 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 교체(rotation) 파일 싱크 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileConfig {
    /// 로그 디렉터리
    pub directory: PathBuf,
    /// 파일 이름 접두사 (날짜가 뒤에 붙음)
    pub file_prefix: String,
    /// 보관할 최대 파일 수
    pub max_files: usize,
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 로그 레벨 필터 (예: "info", "debug", "etl_exchange=debug")
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
    /// span 이벤트 포함 여부 (진입/종료)
    pub with_span_events: bool,
    /// 파일명과 줄 번호 포함 여부
    pub with_file: bool,
    /// 스레드 ID 포함 여부
    pub with_thread_ids: bool,
    /// 대상(모듈 경로) 포함 여부
    pub with_target: bool,
    /// 파일 싱크 (없으면 표준 출력만)
    pub file: Option<LogFileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_span_events: false,
            with_file: true,
            with_thread_ids: false,
            with_target: true,
            file: None,
        }
    }
}

impl LogConfig {
    /// 새 로그 설정을 생성합니다.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// 로그 형식을 설정합니다.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// span 이벤트를 활성화합니다.
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    /// 파일 싱크를 설정합니다.
    pub fn with_file_sink(mut self, file: LogFileConfig) -> Self {
        self.file = Some(file);
        self
    }

    /// 애플리케이션 설정의 `[logging]` 섹션에서 생성합니다.
    ///
    /// 알 수 없는 형식은 pretty로 대체합니다.
    pub fn from_settings(settings: &LoggingConfig) -> Self {
        let file = settings.file.then(|| LogFileConfig {
            directory: PathBuf::from(&settings.directory),
            file_prefix: settings.file_prefix.clone(),
            max_files: settings.max_files,
        });

        Self {
            level: settings.level.clone(),
            format: settings.format.parse().unwrap_or_default(),
            file,
            ..Default::default()
        }
    }
}

/// 파일 싱크의 백그라운드 writer를 유지하는 guard.
///
/// drop되면 버퍼에 남은 로그를 파일에 flush합니다. 프로세스가 끝날 때까지 보관하세요.
#[must_use = "guard를 drop하면 파일 로그가 유실될 수 있습니다"]
pub struct LoggingGuard {
    installed: bool,
    _worker: Option<WorkerGuard>,
}

impl LoggingGuard {
    fn noop() -> Self {
        Self {
            installed: false,
            _worker: None,
        }
    }

    /// 이번 호출에서 subscriber가 설치되었는지 여부.
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

/// 주어진 설정으로 로깅 시스템을 초기화합니다.
///
/// 프로세스당 한 번만 설치되며, 이후 호출은 아무 것도 하지 않습니다.
///
/// # 예제
///
/// ```no_run
/// use etl_core::logging::{init_logging, LogConfig, LogFormat};
///
/// let config = LogConfig::new("debug").with_format(LogFormat::Json);
/// let _guard = init_logging(config).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<LoggingGuard, LoggingError> {
    let guard = init_once(&INITIALIZED, || install(&config))?;

    if guard.installed {
        tracing::info!(
            format = ?config.format,
            level = %config.level,
            file = ?config.file.as_ref().map(|f| &f.directory),
            "Logging initialized"
        );
    }
    Ok(guard)
}

/// `flag`가 내려가 있을 때만 `install`을 실행합니다. 설치에 실패하면 `flag`를 되돌립니다.
fn init_once<F>(flag: &AtomicBool, install: F) -> Result<LoggingGuard, LoggingError>
where
    F: FnOnce() -> Result<LoggingGuard, LoggingError>,
{
    if flag
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(LoggingGuard::noop());
    }

    install().inspect_err(|_| flag.store(false, Ordering::SeqCst))
}

fn install(config: &LogConfig) -> Result<LoggingGuard, LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| LoggingError::Filter(e.to_string()))?;

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(config, std::io::stdout, true)];
    let mut worker = None;

    if let Some(file) = &config.file {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(file.file_prefix.clone())
            .max_log_files(file.max_files.max(1))
            .build(&file.directory)
            .map_err(|e| LoggingError::FileSink(e.to_string()))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        layers.push(fmt_layer(config, writer, false));
        worker = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    Ok(LoggingGuard {
        installed: true,
        _worker: worker,
    })
}

fn fmt_layer<W>(config: &LogConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let span_events = if config.with_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_file(config.with_file)
        .with_line_number(config.with_file)
        .with_thread_ids(config.with_thread_ids)
        .with_target(config.with_target)
        .with_span_events(span_events);

    match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// 수집 실행 컨텍스트 필드가 포함된 span을 생성하는 매크로.
#[macro_export]
macro_rules! etl_span {
    ($name:expr, $symbol:expr) => {
        tracing::info_span!($name, symbol = %$symbol)
    };
    ($name:expr, $symbol:expr, $run_id:expr) => {
        tracing::info_span!($name, symbol = %$symbol, run_id = %$run_id)
    };
}
