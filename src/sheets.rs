//! Spreadsheet provisioning: create the finance spreadsheet once and
//! remember its id in a small JSON record.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::{Credential, CredentialManager, default_scopes};
use crate::config::Config;
use crate::error::{Error, Result, describe_http_error};

pub const DEFAULT_SPREADSHEET_TITLE: &str = "Finance Tracker";

/// Persisted `{"spreadsheetId": "<id>"}` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    #[serde(rename = "spreadsheetId")]
    pub spreadsheet_id: String,
}

impl ResourceRecord {
    pub fn from_json(data: &str) -> std::result::Result<Self, String> {
        let record: ResourceRecord = serde_json::from_str(data).map_err(|e| e.to_string())?;
        if record.spreadsheet_id.trim().is_empty() {
            return Err("spreadsheetId is empty".to_string());
        }
        Ok(record)
    }
}

/// Load the record file, or `None` if it does not exist.
pub fn load_record(path: &Path) -> Result<Option<ResourceRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let load_err = |reason| Error::ResourceRecordLoad {
        path: path.to_path_buf(),
        reason,
    };
    let data = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
    ResourceRecord::from_json(&data).map(Some).map_err(load_err)
}

pub fn save_record(path: &Path, record: &ResourceRecord) -> Result<()> {
    let persist_err = |source| Error::ResourcePersist {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(persist_err)?;
    }
    let data = serde_json::to_string(record).map_err(|e| persist_err(std::io::Error::other(e)))?;
    std::fs::write(path, data).map_err(persist_err)
}

/// Browser URL for a spreadsheet id.
pub fn spreadsheet_url(id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}", id)
}

/// Remote "create spreadsheet" call.
pub trait SpreadsheetApi {
    /// Create a spreadsheet titled `title` and return its id.
    fn create_spreadsheet(&self, title: &str, credential: &Credential) -> Result<String>;
}

impl<T: SpreadsheetApi + ?Sized> SpreadsheetApi for &T {
    fn create_spreadsheet(&self, title: &str, credential: &Credential) -> Result<String> {
        (**self).create_spreadsheet(title, credential)
    }
}

/// Google Sheets v4 REST client.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    base_url: String,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    properties: Properties<'a>,
}

#[derive(Serialize)]
struct Properties<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "spreadsheetId", default)]
    spreadsheet_id: Option<String>,
}

impl SheetsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sheets_api_base())
    }
}

impl SpreadsheetApi for SheetsClient {
    fn create_spreadsheet(&self, title: &str, credential: &Credential) -> Result<String> {
        let url = format!("{}/v4/spreadsheets", self.base_url.trim_end_matches('/'));
        tracing::debug!(%url, title, "creating spreadsheet");
        let body = CreateRequest {
            properties: Properties { title },
        };
        let response = ureq::post(&url)
            .set("Authorization", &format!("Bearer {}", credential.bearer()))
            .send_json(&body)
            .map_err(|e| Error::ResourceCreation(describe_http_error(e)))?;
        let parsed: CreateResponse = response
            .into_json()
            .map_err(|e| Error::ResourceCreation(format!("invalid response: {}", e)))?;
        parsed
            .spreadsheet_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::ResourceCreation("response has no spreadsheetId".to_string()))
    }
}

/// Returns a stable spreadsheet id, creating the spreadsheet at most once.
///
/// The record is trusted once written: if the spreadsheet is later deleted
/// remotely, the stale id keeps being returned.
#[derive(Debug)]
pub struct ResourceProvisioner<S = SheetsClient> {
    record_file: PathBuf,
    api: S,
}

impl ResourceProvisioner<SheetsClient> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(config, SheetsClient::from_config(config))
    }
}

impl<S: SpreadsheetApi> ResourceProvisioner<S> {
    pub fn new(config: &Config, api: S) -> Self {
        Self {
            record_file: config.sheets_config_file(),
            api,
        }
    }

    pub fn record_file(&self) -> &Path {
        &self.record_file
    }

    /// Whether a record already exists on disk.
    pub fn is_provisioned(&self) -> bool {
        self.record_file.exists()
    }

    pub fn ensure_resource(&self, name: &str, credential: &Credential) -> Result<String> {
        if let Some(record) = load_record(&self.record_file)? {
            tracing::debug!(id = %record.spreadsheet_id, "found spreadsheet record");
            return Ok(record.spreadsheet_id);
        }

        let id = self.api.create_spreadsheet(name, credential)?;
        tracing::info!(%id, title = name, "created spreadsheet");
        save_record(
            &self.record_file,
            &ResourceRecord {
                spreadsheet_id: id.clone(),
            },
        )?;
        Ok(id)
    }
}

/// Resolve a credential, then the finance spreadsheet id.
pub fn get_spreadsheet_id(config: &Config, verbose: bool) -> Result<String> {
    let manager = CredentialManager::from_config(config)?;
    let credential = manager.obtain_credential(&default_scopes())?;

    let provisioner = ResourceProvisioner::from_config(config);
    if verbose {
        if provisioner.is_provisioned() {
            println!("Found an existing spreadsheet...");
        } else {
            println!("Creating a new spreadsheet...");
        }
    }
    let id = provisioner.ensure_resource(DEFAULT_SPREADSHEET_TITLE, &credential)?;
    if verbose {
        println!("Spreadsheet: {}", spreadsheet_url(&id));
    }
    Ok(id)
}

/// CLI: gsheets-plaid sheet-id [--verbose]
pub fn run(config: &Config, verbose: bool) -> Result<()> {
    let id = get_spreadsheet_id(config, verbose)?;
    println!("{}", id);
    Ok(())
}
