use archipel_installer::core::path::ROOT_DIR_NAME;
use archipel_installer::di::ManualPicker;
use async_trait::async_trait;
use dialoguer::Input;
use indicatif::ProgressBar;
use std::path::PathBuf;

/// Terminal folder prompt used when detection fails.
///
/// The prompt runs on the blocking pool with the progress bar suspended.
pub struct DialoguerPicker {
    bar: ProgressBar,
}

impl DialoguerPicker {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

#[async_trait]
impl ManualPicker for DialoguerPicker {
    async fn pick(&self) -> Option<PathBuf> {
        let bar = self.bar.clone();
        let answer = tokio::task::spawn_blocking(move || {
            bar.suspend(|| {
                Input::<String>::new()
                    .with_prompt(format!(
                        "Path to the {} folder (leave empty to cancel)",
                        ROOT_DIR_NAME
                    ))
                    .allow_empty(true)
                    .interact_text()
            })
        })
        .await;

        match answer {
            Ok(Ok(path)) if !path.trim().is_empty() => Some(PathBuf::from(path.trim())),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                tracing::warn!("Failed to read input: {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("Folder prompt task failed: {}", e);
                None
            }
        }
    }
}
