//! MCP server initialization for stdio and SSE transports.
//!
//! Provides [`serve_stdio`] and [`serve_sse`] entry points that wire the
//! retrieval engine into a running MCP server.

use crate::config::ArcaConfig;
use crate::engine::RetrievalEngine;
use crate::tools::ArcaTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;

fn build_engine(config: ArcaConfig) -> Result<Arc<RetrievalEngine>> {
    let engine = RetrievalEngine::from_config(Arc::new(config))?;
    tracing::info!("retrieval engine ready");
    Ok(Arc::new(engine))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: ArcaConfig) -> Result<()> {
    tracing::info!("starting Arca MCP server on stdio");

    let engine = build_engine(config)?;
    let tools = ArcaTools::new(engine);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP (SSE) transport.
pub async fn serve_sse(config: ArcaConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting Arca MCP server on SSE/HTTP");

    let engine = build_engine(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(ArcaTools::new(engine.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down SSE server");
        })
        .await?;

    Ok(())
}
