// Hide console window in release builds (Windows GUI app)
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod backend;
mod cli;
mod config;
mod db;
mod models;
mod popup;
mod state;
mod task;
#[cfg(test)]
mod testing;
mod transfer;
mod ui;
mod workflow;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backend::LocalBackend;
use crate::cli::Cli;
use crate::config::Config;
use crate::transfer::HttpTransfer;

#[cfg(windows)]
use windows::Win32::Foundation::HANDLE;
#[cfg(windows)]
use windows::Win32::System::Threading::CreateMutexW;
#[cfg(windows)]
use windows::core::PCWSTR;

/// Hold a named mutex so only one GUI instance runs at a time.
/// The handle must stay alive for the lifetime of the window.
#[cfg(windows)]
fn acquire_single_instance() -> Option<HANDLE> {
    use windows::Win32::Foundation::{ERROR_ALREADY_EXISTS, GetLastError};

    let mutex_name: Vec<u16> = "Global\\BlendioLauncher\0".encode_utf16().collect();

    unsafe {
        let handle = CreateMutexW(None, false, PCWSTR(mutex_name.as_ptr())).ok()?;
        if GetLastError() == ERROR_ALREADY_EXISTS {
            return None;
        }
        Some(handle)
    }
}

#[cfg(not(windows))]
fn acquire_single_instance() -> Option<()> {
    Some(())
}

#[cfg(windows)]
fn show_already_running() {
    use windows::Win32::UI::WindowsAndMessaging::{MB_ICONINFORMATION, MB_OK, MessageBoxW};

    let title: Vec<u16> = "Blendio\0".encode_utf16().collect();
    let msg: Vec<u16> = "Blendio is already running.\0".encode_utf16().collect();
    unsafe {
        MessageBoxW(
            None,
            PCWSTR(msg.as_ptr()),
            PCWSTR(title.as_ptr()),
            MB_OK | MB_ICONINFORMATION,
        );
    }
}

#[cfg(not(windows))]
fn show_already_running() {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "blendio=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Some(command) = cli.command {
        return cli::run(command, cli.output).await;
    }

    tracing::info!("Starting Blendio");

    let Some(_instance_lock) = acquire_single_instance() else {
        tracing::error!("Blendio is already running. Exiting.");
        show_already_running();
        return Ok(());
    };

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    let backend = Arc::new(LocalBackend::open(&config)?);
    let transfer = Arc::new(
        HttpTransfer::new(config.downloads.progress_interval_ms)
            .context("Failed to create HTTP client")?,
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([860.0, 640.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Blendio - Blender Launcher"),
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native(
        "Blendio",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(app::BlendioApp::new(
                cc, config, backend, transfer,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))?;

    Ok(())
}
