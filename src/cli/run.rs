use super::picker::DialoguerPicker;
use archipel_installer::core::cancel::CancelToken;
use archipel_installer::core::InstallerExitCode;
use archipel_installer::di::{EventSink, ManualPicker, ServiceContainer};
use archipel_installer::events::{ChannelSink, FanoutSink, FileLogSink, InstallerEvent};
use archipel_installer::updater::{InstallResult, InstallerOptions};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, BufRead};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub async fn run(options: InstallerOptions) -> InstallerExitCode {
    let mut sinks: Vec<Arc<dyn EventSink>> = Vec::new();
    match FileLogSink::create() {
        Ok(file) => {
            tracing::debug!("Logging to {}", file.path().display());
            sinks.push(Arc::new(file));
        }
        Err(e) => tracing::warn!("Could not open the log file: {}", e),
    }

    let bar = if options.silent {
        ProgressBar::hidden()
    } else {
        progress_bar()
    };
    let (channel, rx) = ChannelSink::new();
    sinks.push(Arc::new(channel));
    let renderer = tokio::spawn(render(rx, bar.clone()));

    let container = match ServiceContainer::new(Arc::new(FanoutSink::new(sinks))) {
        Ok(container) => container,
        Err(e) => {
            bar.finish_and_clear();
            if !options.silent {
                eprintln!("\n❌ {}", e.detailed());
            }
            return e.exit_code();
        }
    };

    let cancel = CancelToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let prompt = DialoguerPicker::new(bar.clone());
    let picker: Option<&dyn ManualPicker> = if options.silent { None } else { Some(&prompt) };

    let updater = container.updater();
    let outcome = updater.run(&options, !options.silent, picker, &cancel).await;
    watcher.abort();

    // Close the channel so the renderer drains and stops
    drop(updater);
    drop(container);
    let _ = renderer.await;

    match outcome {
        Ok(result) => {
            finish(&bar, &result, &options);
            result.exit_code
        }
        Err(cancelled) => {
            bar.abandon_with_message(cancelled.to_string());
            InstallerExitCode::PermissionOrLockedError
        }
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stderr());
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

async fn render(mut rx: UnboundedReceiver<InstallerEvent>, bar: ProgressBar) {
    while let Some(event) = rx.recv().await {
        match event {
            InstallerEvent::Progress(progress) => {
                bar.set_position(u64::from(progress.percent));
                bar.set_message(progress.stage);
            }
            InstallerEvent::Log(line) => bar.println(line),
        }
    }
}

fn finish(bar: &ProgressBar, result: &InstallResult, options: &InstallerOptions) {
    if options.silent {
        return;
    }

    if result.is_success() {
        bar.finish_with_message(result.message.clone());
        if options.no_close {
            eprintln!("Press Enter to close.");
            let mut line = String::new();
            let _ = io::stdin().lock().read_line(&mut line);
        }
    } else {
        bar.abandon();
        eprintln!("\n❌ {} ({})", result.message, result.exit_code);
    }
}
