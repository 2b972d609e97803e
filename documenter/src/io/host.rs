//! Application host: runs the application and exposes its `createFile` port.
//!
//! The application is opaque. It only talks to the shim through [`Ports`],
//! which forwards `createFile` payloads into a bounded channel consumed by the
//! file sink and drops every other port.

use std::future::Future;
use std::process::Stdio;

use anyhow::{Context, Result, anyhow, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::core::request::{FileRequest, PortMessage, Routed, parse_line, route};

/// Something that emits port messages until it finishes.
pub trait Application: Send + 'static {
    fn run(self, ports: Ports) -> impl Future<Output = Result<()>> + Send;
}

/// Outbound ports handed to a running application.
#[derive(Debug, Clone)]
pub struct Ports {
    create_file: mpsc::Sender<FileRequest>,
}

impl Ports {
    /// Deliver one message to its subscriber.
    ///
    /// A `createFile` payload that does not decode is an error: every
    /// `createFile` message ends up either written or fatal.
    pub async fn emit(&self, message: PortMessage) -> Result<()> {
        match route(message)? {
            Routed::CreateFile(request) => {
                debug!(name = %request.name, bytes = request.content.len(), "createFile");
                self.create_file
                    .send(request)
                    .await
                    .map_err(|_| anyhow!("createFile subscriber closed"))?;
            }
            Routed::Unsubscribed(port) => {
                debug!(port = %port, "ignoring message for unsubscribed port");
            }
        }
        Ok(())
    }
}

/// A running application and the receiving end of its `createFile` port.
#[derive(Debug)]
pub struct ApplicationHandle {
    pub create_file: mpsc::Receiver<FileRequest>,
    pub task: JoinHandle<Result<()>>,
}

/// Start `app` on the runtime and hand back its event channel.
///
/// Must be called once per run, from within a tokio runtime.
pub fn initialize<A: Application>(app: A, channel_capacity: usize) -> ApplicationHandle {
    let (tx, rx) = mpsc::channel(channel_capacity);
    let task = tokio::spawn(app.run(Ports { create_file: tx }));
    ApplicationHandle {
        create_file: rx,
        task,
    }
}

/// Application reading port messages as JSON lines from a buffered reader.
pub struct LineApplication<R> {
    reader: R,
    source: String,
}

impl<R> LineApplication<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            reader,
            source: source.into(),
        }
    }
}

impl LineApplication<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

impl<R> Application for LineApplication<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn run(self, ports: Ports) -> Result<()> {
        pump_lines(self.reader, &self.source, &ports).await?;
        Ok(())
    }
}

/// Application backed by a child process writing port messages to stdout.
///
/// The child's stderr is inherited so its diagnostics reach the terminal.
#[derive(Debug)]
pub struct ProcessApplication {
    child: Child,
    stdout: BufReader<ChildStdout>,
    program: String,
}

impl ProcessApplication {
    /// Spawn `command` (program followed by its arguments).
    pub fn spawn(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("application command is empty")?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn application {program}"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout was not piped"))?;
        info!(program = %program, pid = ?child.id(), "application started");
        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            program: program.clone(),
        })
    }
}

impl Application for ProcessApplication {
    async fn run(self, ports: Ports) -> Result<()> {
        let Self {
            mut child,
            stdout,
            program,
        } = self;
        let lines = pump_lines(stdout, &program, &ports).await?;
        let status = child
            .wait()
            .await
            .with_context(|| format!("wait for application {program}"))?;
        debug!(program = %program, lines, exit_code = ?status.code(), "application finished");
        if !status.success() {
            bail!("application {program} exited with {status}");
        }
        Ok(())
    }
}

/// Forward every port message read from `reader`; returns the number of lines read.
#[instrument(skip(reader, ports))]
async fn pump_lines<R>(reader: R, source: &str, ports: &Ports) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no: u64 = 0;
    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("read {source}"))?
    {
        line_no += 1;
        match parse_line(&line) {
            Ok(Some(message)) => ports
                .emit(message)
                .await
                .with_context(|| format!("{source} line {line_no}"))?,
            Ok(None) => {}
            Err(err) => {
                warn!(line = line_no, error = %format!("{err:#}"), "skipping line that is not a port message");
            }
        }
    }
    Ok(line_no)
}
