// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, fmt::Debug, io, path::PathBuf};

use davgate_core::CoordinatorError;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncReadExt;

/// Where a JSON payload is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

impl PayloadSource {
    pub async fn read<T: DeserializeOwned>(&self) -> Result<T, Box<dyn Error>> {
        let text = match self {
            Self::Inline(text) => text.clone(),
            Self::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("Failed to read payload from {}: {e}", path.display()))?,
            Self::Stdin => {
                let mut text = String::new();
                tokio::io::stdin().read_to_string(&mut text).await?;
                text
            }
        };

        serde_json::from_str(&text).map_err(|e| format!("Invalid payload: {e}").into())
    }
}

/// Writes `value` to stdout as pretty JSON.
pub fn print_json(value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    write_json(&mut io::stdout().lock(), value)
}

pub fn write_json(buf: &mut impl io::Write, value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    serde_json::to_writer_pretty(&mut *buf, value)?;
    writeln!(buf)?;
    Ok(())
}

/// Prints the JSON error body of a failed gateway call and converts the
/// error for the top level.
pub fn report<R: Debug + Serialize>(err: CoordinatorError<R>) -> Box<dyn Error> {
    tracing::debug!(status = err.status_code(), "gateway call failed");
    if let Err(e) = print_json(&err.detail()) {
        tracing::warn!(%e, "failed to print error body");
    }
    format!("{err} (status {})", err.status_code()).into()
}
