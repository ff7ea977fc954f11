//! GTP engine running as a child process.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::EngineError;
use crate::gtp::{Response, Transport};

/// How long the engine gets to exit after `quit` before it is killed.
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ProcessTransport {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<Result<Response, EngineError>>,
}

impl ProcessTransport {
    /// Spawns `program` with `args`. The engine's stderr is inherited.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, EngineError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| EngineError::io(format!("spawn engine '{program}'"), e))?;

        let stdin = child.stdin.take().ok_or(EngineError::Disconnected)?;
        let stdout = child.stdout.take().ok_or(EngineError::Disconnected)?;
        log::info!("started engine '{program}' (pid {})", child.id());

        // A response is every line up to the next empty line.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            let mut block = String::new();
            for line in reader.lines().map_while(Result::ok) {
                let line = line.trim_end_matches('\r');
                if line.trim().is_empty() {
                    if block.is_empty() {
                        continue;
                    }
                    if tx.send(Response::parse(&block)).is_err() {
                        return;
                    }
                    block.clear();
                } else {
                    if !block.is_empty() {
                        block.push('\n');
                    }
                    block.push_str(line);
                }
            }
            log::debug!("engine output closed");
        });

        Ok(Self {
            child,
            stdin: BufWriter::new(stdin),
            rx,
        })
    }
}

impl ProcessTransport {
    /// OS process id of the engine.
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl Transport for ProcessTransport {
    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        writeln!(self.stdin, "{line}").map_err(|e| EngineError::io("write to engine", e))?;
        self.stdin.flush().map_err(|e| EngineError::io("flush engine stdin", e))
    }

    fn recv(&mut self) -> Result<Response, EngineError> {
        self.rx.recv().map_err(|_| EngineError::Disconnected)?
    }

    fn try_recv(&mut self) -> Result<Option<Response>, EngineError> {
        match self.rx.try_recv() {
            Ok(response) => response.map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(EngineError::Disconnected),
        }
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        if self.send("quit").is_ok() {
            let start = Instant::now();
            while start.elapsed() < QUIT_TIMEOUT {
                match self.child.try_wait() {
                    Ok(Some(_)) => return,
                    Ok(None) => thread::sleep(Duration::from_millis(20)),
                    Err(_) => break,
                }
            }
        }
        log::warn!("engine did not quit, killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
