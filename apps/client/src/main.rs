//! Agora client runtime: wires the session and permission context and runs
//! one command against it.

#![forbid(unsafe_code)]

mod client_config;
mod client_context;
mod commands;

use std::env;

use agora_core::AppError;
use tracing::info;

use crate::client_config::{ClientConfig, init_tracing};
use crate::commands::Command;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let arguments: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&arguments)?;
    let config = ClientConfig::load()?;

    let context = client_context::build_client_context(&config).await?;
    let restored = context.auth.restore().await;
    info!(
        signed_in = restored.is_some(),
        route = context.auth.launch_route().await.as_str(),
        "agora-client started"
    );

    commands::run(&context, command).await
}
