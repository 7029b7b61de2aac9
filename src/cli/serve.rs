use anyhow::Result;

use crate::api;
use crate::core::{AppConfig, credential};

pub async fn run(host: String, port: String, config: AppConfig) -> Result<()> {
    // The page asks for the key when the environment doesn't have one
    let credential = credential::resolve(false)?;
    api::serve(host, port, config, credential).await
}
