// Trusted-Oracle Prediction Market - Main Entry Point

use trusted_oracle_market::{router, AppState, MarketConfig};

#[tokio::main]
async fn main() {
    let config = match MarketConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .with_target(false)
        .init();

    println!("\n═══════════════════════════════════════════════");
    println!("     🎲 Trusted-Oracle Prediction Market");
    println!("═══════════════════════════════════════════════\n");

    let addr = config.bind_addr;
    let state = match AppState::load_or_new(config) {
        Ok(state) => state.into_shared(),
        Err(e) => {
            tracing::error!(error = %e, "refusing to start over unreadable market state");
            std::process::exit(1);
        }
    };

    // Clone state for shutdown handler before moving into router
    let shutdown_state = state.clone();
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    println!("📡 http://{}", addr);
    println!("📋 Available Endpoints:");
    println!("   GET  /admin                          - Market administrator");
    println!("   POST /trusted-sources                - Add trusted source (admin)");
    println!("   GET  /trusted-sources/:identity      - Is identity a trusted source");
    println!("   POST /questions                      - Add question (admin)");
    println!("   GET  /questions                      - List questions");
    println!("   GET  /questions/:id                  - Question details");
    println!("   POST /questions/:id/bets             - Place bet");
    println!("   GET  /questions/:id/bets/:bettor     - Bet details");
    println!("   POST /questions/:id/resolve          - Resolve question (trusted source)");
    println!("   POST /questions/:id/claim            - Claim winnings");
    println!("   POST /running                        - Start/stop market (admin)");
    println!("   GET  /events                         - Market activity");
    println!("   GET  /escrow                         - Escrow balance and solvency\n");

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            return;
        }

        println!("\n🛑 Shutdown signal received, saving state...");
        match shutdown_state.lock() {
            Ok(app_state) => {
                if let Err(e) = app_state.save_to_disk() {
                    eprintln!("❌ Failed to save state: {}", e);
                }
            }
            Err(_) => eprintln!("❌ State lock poisoned, nothing saved"),
        }
        std::process::exit(0);
    });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server stopped");
    }
}
