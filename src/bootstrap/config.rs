use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;

use crate::domain::uploads::{AllowedExtensions, StoredName};

#[derive(Clone, Debug)]
pub struct Config {
    pub api_host: IpAddr,
    pub api_port: u16,
    pub frontend_url: Option<String>,
    pub storage_root: PathBuf,
    pub upload_max_bytes: usize,
    pub allowed_extensions: AllowedExtensions,
    pub fixed_upload_name: StoredName,
    pub is_production: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source; unset keys fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = match lookup("API_HOST") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("API_HOST is not an IP address: {raw}"))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let api_port = match lookup("API_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("API_PORT is not a valid port: {raw}"))?,
            None => 5000,
        };
        let frontend_url = lookup("FRONTEND_URL").filter(|v| !v.trim().is_empty());
        let storage_root = lookup("STORAGE_ROOT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./images"));
        let upload_max_bytes: usize = match lookup("UPLOAD_MAX_BYTES") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("UPLOAD_MAX_BYTES is not a byte count: {raw}"))?,
            None => 25 * 1024 * 1024,
        };
        if upload_max_bytes == 0 {
            anyhow::bail!("UPLOAD_MAX_BYTES must be greater than zero");
        }
        let allowed_extensions = lookup("ALLOWED_EXTENSIONS")
            .map(|list| AllowedExtensions::parse_list(&list))
            .unwrap_or_default();
        if allowed_extensions.is_empty() {
            anyhow::bail!("ALLOWED_EXTENSIONS must name at least one extension");
        }
        let fixed_upload_name = {
            let raw = lookup("FIXED_UPLOAD_NAME").unwrap_or_else(|| "image.jpg".into());
            StoredName::from_segment(raw.trim())
                .with_context(|| format!("FIXED_UPLOAD_NAME is not a plain file name: {raw}"))?
        };
        let is_production = matches!(
            lookup("RUST_ENV").as_deref(),
            Some("production") | Some("prod")
        );

        if is_production
            && !frontend_url
                .as_deref()
                .map(|u| u.starts_with("http://") || u.starts_with("https://"))
                .unwrap_or(false)
        {
            anyhow::bail!(
                "FRONTEND_URL must be set to a full origin in production (e.g., https://app.example.com)"
            );
        }

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            storage_root,
            upload_max_bytes,
            allowed_extensions,
            fixed_upload_name,
            is_production,
        })
    }
}
