use hello_mcp_server::config::ServerConfig;
use hello_mcp_server::server::McpServer;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("hello-mcp-server: configuration error: {e}");
            std::process::exit(1);
        }
    };

    let mut server = McpServer::new(config);
    if let Err(e) = server.run().await {
        eprintln!("hello-mcp-server: fatal error: {e}");
        std::process::exit(1);
    }
}
