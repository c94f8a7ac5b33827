use env_logger::{Builder, Target};
use log::{LevelFilter, debug};
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
    sync::OnceLock,
};
static LOGGER: OnceLock<()> = OnceLock::new();
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub level: Option<LevelFilter>,
    pub filter: Option<String>,
    pub file: Option<PathBuf>,
}
/// Installs the process-wide logger once. Later calls are no-ops.
pub fn init(options: &LogOptions) -> io::Result<()> {
    let mut outcome = Ok(());
    LOGGER.get_or_init(|| outcome = install(options));
    outcome
}
fn install(options: &LogOptions) -> io::Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(options.level.unwrap_or(LevelFilter::Info));
    if let Some(filter) = &options.filter {
        builder.parse_filters(filter);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {}",
            buf.timestamp_millis(),
            record.level(),
            record.args()
        )
    });
    if let Some(path) = &options.file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(Tee {
            file,
            stderr: io::stderr(),
        })));
    }
    if builder.try_init().is_err() {
        debug!("logger already installed");
    }
    Ok(())
}
struct Tee {
    file: File,
    stderr: io::Stderr,
}
impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        self.stderr.write_all(buf)?;
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.stderr.flush()
    }
}
