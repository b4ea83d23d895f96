//! Console adapter: operator input from a line reader (stdin by default) and
//! transient image files in a local directory.

use std::{
    fs,
    io::{BufRead, BufReader, IsTerminal},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use qlogin_core::{
    ports::{ArtifactStore, Operator},
    utils::{read_detached, read_line_timeout},
    Result,
};
use tracing::debug;

type SharedReader = Arc<Mutex<Box<dyn BufRead + Send>>>;

/// Operator backed by a line reader.
///
/// Reads run on detached threads, so a read abandoned by a timeout keeps the
/// reader busy until its line arrives; that line is then discarded.
#[derive(Clone)]
pub struct ConsoleOperator {
    input: SharedReader,
    interactive: bool,
}

impl ConsoleOperator {
    pub fn stdin() -> Self {
        let interactive = std::io::stdin().is_terminal();
        Self::from_reader(BufReader::new(std::io::stdin()), interactive)
    }

    pub fn from_reader(reader: impl BufRead + Send + 'static, interactive: bool) -> Self {
        Self {
            input: Arc::new(Mutex::new(Box::new(reader))),
            interactive,
        }
    }

    fn reader_task(&self) -> impl FnOnce() -> Option<String> + Send + 'static {
        let input = self.input.clone();
        move || {
            let mut guard = input.lock().ok()?;
            let mut line = String::new();
            match guard.read_line(&mut line) {
                Ok(0) => None,
                Ok(_) => Some(line.trim().to_string()),
                Err(e) => {
                    debug!("console read failed: {e}");
                    None
                }
            }
        }
    }
}

#[async_trait]
impl Operator for ConsoleOperator {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    async fn read_line(&self) -> String {
        read_detached(self.reader_task()).await.unwrap_or_default()
    }

    async fn read_line_timeout(&self, timeout: Duration) -> Option<String> {
        read_line_timeout(self.reader_task(), timeout).await
    }
}

/// Writes operator-facing images (QR code, captcha) into a directory.
#[derive(Clone, Debug)]
pub struct FsArtifacts {
    dir: PathBuf,
}

impl FsArtifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactStore for FsArtifacts {
    fn save(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(name);
        fs::write(&path, data)?;
        Ok(path)
    }

    fn remove(&self, name: &str) {
        let path = self.dir.join(name);
        if let Err(e) = fs::remove_file(&path) {
            debug!("could not remove {}: {e}", path.display());
        }
    }
}
