use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::command::{parse, Command, HELP};
use super::render::{render, render_alert};
use crate::controller::{Alert, FormController};
use crate::domain::{FormSnapshot, PendingFile};

/// Line-driven front end: reads commands, forwards them to the controller, redraws.
pub struct Terminal<R, W> {
    input: R,
    output: W,
    view: watch::Receiver<FormSnapshot>,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W, view: watch::Receiver<FormSnapshot>) -> Self {
        Self { input, output, view }
    }

    #[allow(dead_code)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs until `quit` or end of input.
    #[instrument(name = "terminal", skip_all)]
    pub async fn run(&mut self, controller: &mut FormController) -> std::io::Result<()> {
        self.redraw().await?;
        self.write_line(HELP).await?;

        let mut line = String::new();
        loop {
            self.output.write_all(b"> ").await?;
            self.output.flush().await?;

            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                break;
            }

            let command = match parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(usage) => {
                    self.write_line(&usage).await?;
                    continue;
                }
            };
            debug!(?command, "Command received");

            if command == Command::Quit {
                break;
            }
            self.dispatch(command, controller).await?;
        }
        Ok(())
    }

    async fn dispatch(&mut self, command: Command, controller: &mut FormController) -> std::io::Result<()> {
        let alert = match command {
            Command::Set(field, value) => {
                controller.set_field(field, value);
                None
            }
            Command::File(path) => match read_image(&path).await {
                Ok(file) => {
                    controller.select_file(file);
                    None
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not read image");
                    Some(Alert::error(format!("Cannot read {}: {}", path.display(), e)))
                }
            },
            Command::NoFile => {
                controller.clear_file();
                None
            }
            Command::Create => Some(controller.create().await),
            Command::Key(key) => {
                controller.set_lookup_key(key);
                None
            }
            Command::Fetch => {
                // Outcome lands on the status line.
                let _ = controller.fetch().await;
                None
            }
            Command::Update if controller.lookup().record.is_none() => {
                self.write_line("Fetch a user first; there is nothing to update.").await?;
                return Ok(());
            }
            Command::Update => Some(controller.update().await),
            Command::Help => {
                self.write_line(HELP).await?;
                return Ok(());
            }
            Command::Show => None,
            Command::Quit => return Ok(()),
        };

        if let Some(alert) = alert {
            self.write_line(&render_alert(&alert)).await?;
        }
        self.redraw().await
    }

    async fn redraw(&mut self) -> std::io::Result<()> {
        let page = render(&self.view.borrow_and_update());
        self.write_line(&page).await
    }

    async fn write_line(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}

/// Loads the chosen image into memory, keeping its file name for the storage key.
async fn read_image(path: &Path) -> std::io::Result<PendingFile> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(PendingFile::new(name, bytes))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::repository::UserRepository;
    use crate::uploader::ImageUploader;

    async fn run_script(script: &str) -> String {
        let (actor, client) = MemoryBackend::new(10, "avatars");
        tokio::spawn(actor.run());
        let client = Arc::new(client);
        let mut controller = FormController::new(ImageUploader::new(client.clone()), UserRepository::new(client));

        let mut terminal = Terminal::new(script.as_bytes(), Vec::new(), controller.subscribe());
        terminal.run(&mut controller).await.unwrap();
        String::from_utf8(terminal.into_output()).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_fetch_session() {
        let output = run_script(
            "set username alice\nset name Alice A\nset email a@x.com\nset age 30\ncreate\nkey a@x.com\nfetch\nquit\n",
        )
        .await;

        assert!(output.contains("User created!"));
        assert!(output.contains("Edit User"));
        assert!(output.contains("a@x.com (read-only)"));
    }

    #[tokio::test]
    async fn test_update_needs_loaded_record() {
        let output = run_script("update\n").await;
        assert!(output.contains("Fetch a user first"));
        assert!(!output.contains("Email is required"));
    }

    #[tokio::test]
    async fn test_missing_image_file_alerts() {
        let output = run_script("file /definitely/not/here.png\n").await;
        assert!(output.contains("| ERROR"));
        assert!(output.contains("Cannot read /definitely/not/here.png"));
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_forwarded() {
        let output = run_script("drop table users\nfetch\n").await;
        assert!(output.contains("Unknown command 'drop'"));
        assert!(output.contains("Please enter username or email to fetch"));
    }
}
