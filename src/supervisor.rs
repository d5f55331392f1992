//! Subprocess Supervisor (component G): spawns a child, watches for its
//! exit in the background, and lets the owner of a table entry request a
//! polite-then-forced shutdown.
//!
//! Every spawned child is given a piped stdin. "Polite terminate" means
//! dropping our end of that pipe so the child observes EOF on stdin and
//! begins its own orderly shutdown (both `lobby-server` and `room-server`
//! watch stdin for this in their accept loops); "force kill" falls back to
//! the OS-level kill tokio exposes when the child doesn't exit in time.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{ChildStdin, Command};
use tokio::sync::{oneshot, watch, Mutex};

/// A handle to a spawned, supervised child process. Stored in the owning
/// table (`lobbies` in the central server, `rooms` in a lobby) alongside the
/// rest of that entry's bookkeeping.
pub struct ChildHandle {
    pub pid: Option<u32>,
    stdin: Mutex<Option<ChildStdin>>,
    kill_tx: Mutex<Option<oneshot::Sender<()>>>,
    exited: watch::Receiver<bool>,
}

impl ChildHandle {
    pub fn is_alive(&self) -> bool {
        !*self.exited.borrow()
    }

    /// Drops our end of the child's stdin pipe, signalling it to exit on its
    /// own. Idempotent: a second call is a no-op.
    pub async fn request_stop(&self) {
        self.stdin.lock().await.take();
    }

    /// Sends the forced-kill signal if the supervisor task hasn't already
    /// reaped the child through other means.
    pub async fn force_kill(&self) {
        if let Some(tx) = self.kill_tx.lock().await.take() {
            let _ = tx.send(());
        }
    }

    /// Waits up to `timeout` for the child to have exited.
    pub async fn wait_exited(&self, timeout: Duration) -> bool {
        let mut rx = self.exited.clone();
        if *rx.borrow() {
            return true;
        }
        tokio::time::timeout(timeout, rx.changed()).await.is_ok()
    }
}

/// Spawns `cmd` and arranges for `on_exit` to run (once) when the child
/// terminates, whether by itself or via [`ChildHandle::force_kill`].
/// `on_exit` receives the child's pid so callers can do the
/// "compare-and-remove" dance against their owning table (§4.5, §9): check
/// the table entry's pid still matches before removing it, so a racing
/// restart isn't clobbered.
pub fn spawn_supervised<F, Fut>(mut cmd: Command, on_exit: F) -> std::io::Result<ChildHandle>
where
    F: FnOnce(Option<u32>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    cmd.stdin(Stdio::piped());
    cmd.kill_on_drop(false);
    let mut child = cmd.spawn()?;
    let pid = child.id();
    let stdin = child.stdin.take();

    let (kill_tx, kill_rx) = oneshot::channel::<()>();
    let (exited_tx, exited_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut kill_rx = kill_rx;
        tokio::select! {
            _ = child.wait() => {}
            _ = &mut kill_rx => {
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
        }
        let _ = exited_tx.send(true);
        on_exit(pid).await;
    });

    Ok(ChildHandle {
        pid,
        stdin: Mutex::new(stdin),
        kill_tx: Mutex::new(Some(kill_tx)),
        exited: exited_rx,
    })
}

/// Polite-terminate, bounded wait, then force-kill — the stop sequence used
/// by both `stop_game_server` (central) and the room-server stop path
/// described in §5 ("Room-server stop: polite terminate, wait bounded
/// (≈5s), then force kill").
pub async fn graceful_stop(handle: &ChildHandle, timeout: Duration) {
    handle.request_stop().await;
    if !handle.wait_exited(timeout).await {
        handle.force_kill().await;
        let _ = handle.wait_exited(Duration::from_secs(2)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn sleep_command(seconds: &str) -> Command {
        let mut cmd = Command::new("sleep");
        cmd.arg(seconds);
        cmd
    }

    #[tokio::test]
    async fn on_exit_fires_after_natural_exit() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = ran.clone();
        let handle = spawn_supervised(sleep_command("0"), move |_pid| async move {
            ran2.store(true, Ordering::SeqCst);
        })
        .unwrap();

        assert!(handle.wait_exited(Duration::from_secs(2)).await);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn force_kill_terminates_a_long_running_child() {
        let handle = spawn_supervised(sleep_command("30"), |_pid| async {}).unwrap();
        assert!(handle.is_alive());
        graceful_stop(&handle, Duration::from_millis(50)).await;
        assert!(handle.wait_exited(Duration::from_secs(2)).await);
    }
}
