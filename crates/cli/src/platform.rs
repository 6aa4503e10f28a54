//! Desktop integrations: the system clipboard and the OS link handler.

use std::process::{Command, Stdio};

use preciosa_storefront::services::caption::{Clipboard, ClipboardError};
use preciosa_storefront::services::checkout::{LinkOpener, OpenLinkError};

/// The system clipboard.
///
/// Each write opens a fresh handle on its own thread; some platforms bind
/// the clipboard to the thread that created it.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_owned();
        std::thread::spawn(move || {
            let mut clipboard = arboard::Clipboard::new()?;
            clipboard.set_text(text)
        })
        .join()
        .map_err(|_| ClipboardError("clipboard thread panicked".into()))?
        .map_err(|e| ClipboardError(e.to_string()))
    }
}

/// Hands links to the desktop's default handler.
pub struct SystemOpener;

impl SystemOpener {
    fn command(url: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut command = Command::new("open");
            command.arg(url);
            command
        } else if cfg!(target_os = "windows") {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", "", url]);
            command
        } else {
            let mut command = Command::new("xdg-open");
            command.arg(url);
            command
        }
    }
}

impl LinkOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), OpenLinkError> {
        let status = Self::command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| OpenLinkError(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(OpenLinkError(format!("link handler exited with {status}")))
        }
    }
}
