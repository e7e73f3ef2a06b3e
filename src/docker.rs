// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Container transport for the running Open WebUI service
//!
//! The database file and generated images move in and out of the service
//! container through [`ContainerTransport`]. [`DockerCli`] drives the
//! `docker` binary.

use std::path::Path;
use std::process::{Command, Output};

use crate::error::{MigratorError, Result};
use crate::models::MediaCopy;

/// Moves files into and out of the service container
pub trait ContainerTransport {
    /// Container the transport talks to
    fn container_name(&self) -> &str;

    fn stop(&self) -> Result<()>;

    fn start(&self) -> Result<()>;

    /// Copy `container_path` to `local_path`
    fn copy_from(&self, container_path: &str, local_path: &Path) -> Result<()>;

    /// Copy `local_path` to `container_path`
    fn copy_to(&self, local_path: &Path, container_path: &str) -> Result<()>;

    /// Run a command inside the container, returning its stdout
    fn exec(&self, command: &[&str]) -> Result<String>;

    /// Create a folder inside the container; failures are ignored
    fn create_directory(&self, container_path: &str) {
        if let Err(e) = self.exec(&["mkdir", "-p", container_path]) {
            log::debug!("mkdir {} failed: {}", container_path, e);
        }
    }

    fn exists(&self) -> Result<bool>;

    fn is_running(&self) -> Result<bool>;

    /// Start the container and confirm it is up
    fn start_and_verify(&self) -> Result<()> {
        self.start()?;
        if self.is_running()? {
            Ok(())
        } else {
            Err(MigratorError::ContainerNotRunning(
                self.container_name().to_string(),
            ))
        }
    }
}

/// [`ContainerTransport`] over the `docker` command line
#[derive(Debug, Clone)]
pub struct DockerCli {
    container: String,
}

impl DockerCli {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
        }
    }

    fn docker(&self, args: &[&str]) -> Result<Output> {
        Command::new("docker").args(args).output().map_err(|e| {
            MigratorError::Docker(format!("Failed to run docker {}: {}", args.join(" "), e))
        })
    }

    fn stderr(output: &Output) -> String {
        String::from_utf8_lossy(&output.stderr).trim().to_string()
    }

    fn container_path(&self, path: &str) -> String {
        format!("{}:{}", self.container, path)
    }

    fn listed(&self, args: &[&str]) -> Result<bool> {
        let output = self.docker(args)?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|name| name.trim() == self.container))
    }
}

impl ContainerTransport for DockerCli {
    fn container_name(&self) -> &str {
        &self.container
    }

    fn stop(&self) -> Result<()> {
        log::info!("Stopping {} container...", self.container);
        let output = self.docker(&["stop", &self.container])?;
        let stderr = Self::stderr(&output);
        if !output.status.success() && !stderr.contains("No such container") {
            return Err(MigratorError::Docker(format!(
                "Failed to stop container: {}",
                stderr
            )));
        }
        Ok(())
    }

    fn start(&self) -> Result<()> {
        log::info!("Starting {} container...", self.container);
        let output = self.docker(&["start", &self.container])?;
        if !output.status.success() {
            return Err(MigratorError::Docker(format!(
                "Failed to start container: {}",
                Self::stderr(&output)
            )));
        }
        Ok(())
    }

    fn copy_from(&self, container_path: &str, local_path: &Path) -> Result<()> {
        log::info!(
            "Copying {} from container to {}...",
            container_path,
            local_path.display()
        );
        let source = self.container_path(container_path);
        let dest = local_path.to_string_lossy();
        let output = self.docker(&["cp", &source, &dest])?;
        if !output.status.success() {
            return Err(MigratorError::Docker(format!(
                "Failed to copy from container: {}",
                Self::stderr(&output)
            )));
        }
        Ok(())
    }

    fn copy_to(&self, local_path: &Path, container_path: &str) -> Result<()> {
        let source = local_path.to_string_lossy();
        let dest = self.container_path(container_path);
        let output = self.docker(&["cp", &source, &dest])?;
        if !output.status.success() {
            return Err(MigratorError::Docker(format!(
                "Failed to copy to container: {}",
                Self::stderr(&output)
            )));
        }
        Ok(())
    }

    fn exec(&self, command: &[&str]) -> Result<String> {
        let mut args = vec!["exec", self.container.as_str()];
        args.extend_from_slice(command);
        let output = self.docker(&args)?;
        if !output.status.success() {
            return Err(MigratorError::Docker(format!(
                "Command failed in container: {}",
                Self::stderr(&output)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn exists(&self) -> Result<bool> {
        self.listed(&["ps", "-a", "--format", "{{.Names}}"])
    }

    fn is_running(&self) -> Result<bool> {
        self.listed(&["ps", "--format", "{{.Names}}"])
    }
}

/// Pulls and pushes the service database
pub struct DatabaseSync<'a> {
    transport: &'a dyn ContainerTransport,
    container_db_path: &'a str,
}

impl<'a> DatabaseSync<'a> {
    pub fn new(transport: &'a dyn ContainerTransport, container_db_path: &'a str) -> Self {
        Self {
            transport,
            container_db_path,
        }
    }

    pub fn pull(&self, local_db: &Path) -> Result<()> {
        log::info!("Copying database from the container...");
        self.transport.copy_from(self.container_db_path, local_db)
    }

    pub fn push(&self, local_db: &Path) -> Result<()> {
        log::info!("Copying updated database back to the container...");
        self.transport.copy_to(local_db, self.container_db_path)
    }
}

/// Copies generated images into the service's upload storage
pub struct ImageSync<'a> {
    transport: &'a dyn ContainerTransport,
    uploads_path: &'a str,
}

impl<'a> ImageSync<'a> {
    pub fn new(transport: &'a dyn ContainerTransport, uploads_path: &'a str) -> Self {
        Self {
            transport,
            uploads_path,
        }
    }

    /// Copy every image, returning `(copied, failed)`
    pub fn sync_images(&self, images: &[MediaCopy]) -> (usize, usize) {
        if images.is_empty() {
            log::info!("No AI-generated images to copy.");
            return (0, 0);
        }
        log::info!("Found {} AI-generated images to copy.", images.len());

        self.transport.create_directory(self.uploads_path);

        let mut copied = 0;
        let mut failed = 0;
        for image in images {
            if !image.source.exists() {
                log::warn!("Source file not found: {}", image.source.display());
                failed += 1;
                continue;
            }

            let dest = format!("{}/{}", self.uploads_path.trim_end_matches('/'), image.dest_name);
            match self.transport.copy_to(&image.source, &dest) {
                Ok(()) => copied += 1,
                Err(e) => {
                    log::warn!("Failed to copy {}: {}", image.source.display(), e);
                    failed += 1;
                }
            }
        }

        log::info!("Successfully copied {} AI-generated images.", copied);
        if failed > 0 {
            log::warn!("Failed to copy {} images.", failed);
        }
        (copied, failed)
    }
}
